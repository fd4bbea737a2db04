use std::path::PathBuf;

use crate::listing;

pub const DEFAULT_TEMPLATE: &str = "index.html.tmpl";

/// Everything one indexing run needs, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub bucket: String,
    /// Normalized: no leading or trailing `/`, empty at the bucket root
    pub prefix: String,
    pub title: String,
    pub recursive: bool,
    pub upload: bool,
    /// Link base without trailing `/`; empty gives root-relative links
    pub base_url: String,
    pub template_path: PathBuf,
}

pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_owned()
}

pub fn default_title(prefix: &str) -> String {
    format!("Index of /{prefix}")
}

impl IndexConfig {
    pub fn new(bucket: impl Into<String>, prefix: &str) -> IndexConfig {
        let prefix = normalize_prefix(prefix);
        IndexConfig {
            bucket: bucket.into(),
            title: default_title(&prefix),
            prefix,
            recursive: false,
            upload: false,
            base_url: String::new(),
            template_path: PathBuf::from(DEFAULT_TEMPLATE),
        }
    }
    pub fn with_title(mut self, title: Option<String>) -> Self {
        if let Some(title) = title {
            self.title = title;
        }
        self
    }
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }
    pub fn with_template(mut self, path: PathBuf) -> Self {
        self.template_path = path;
        self
    }
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
    pub fn upload(mut self, upload: bool) -> Self {
        self.upload = upload;
        self
    }

    /// Where the rendered page is uploaded, and which key is never listed
    pub fn index_key(&self) -> String {
        listing::index_key(&self.prefix)
    }

    /// Prefix sent to `ListObjectsV2`
    pub fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }
}

#[test]
fn test_prefix_normalized() {
    assert_eq!(IndexConfig::new("b", "/").prefix, "");
    assert_eq!(IndexConfig::new("b", "").prefix, "");
    assert_eq!(IndexConfig::new("b", "/docs/v1/").prefix, "docs/v1");
}

#[test]
fn test_derived_keys() {
    let root = IndexConfig::new("b", "/");
    assert_eq!(root.index_key(), "index.html");
    assert_eq!(root.list_prefix(), "");
    assert_eq!(root.title, "Index of /");

    let nested = IndexConfig::new("b", "docs/");
    assert_eq!(nested.index_key(), "docs/index.html");
    assert_eq!(nested.list_prefix(), "docs/");
    assert_eq!(nested.title, "Index of /docs");
}

#[test]
fn test_builders() {
    let config = IndexConfig::new("b", "p")
        .with_title(Some("Downloads".to_owned()))
        .with_base_url("https://cdn.example.com/")
        .recursive(true)
        .upload(true);
    assert_eq!(config.title, "Downloads");
    assert_eq!(config.base_url, "https://cdn.example.com");
    assert!(config.recursive);
    assert!(config.upload);
    assert_eq!(config.template_path, PathBuf::from(DEFAULT_TEMPLATE));

    let untitled = IndexConfig::new("b", "p").with_title(None);
    assert_eq!(untitled.title, "Index of /p");
}

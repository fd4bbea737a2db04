//! HTML page rendering.
//!
//! Templates use minijinja syntax. Auto-escaping is forced to HTML for every
//! template, whatever its file extension, since object keys are untrusted.

use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

use crate::listing::Entry;

const TEMPLATE_NAME: &str = "index";

#[derive (thiserror::Error, Debug)]
pub enum Error {
    #[error("reading template {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing template {path:?}: {source}")]
    TemplateSyntax {
        path: PathBuf,
        source: minijinja::Error,
    },
    #[error("rendering page: {0}")]
    Render(#[source] minijinja::Error),
}

/// Template context
#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub title: &'a str,
    pub bucket: &'a str,
    pub prefix: &'a str,
    pub directories: &'a [Entry],
    pub files: &'a [Entry],
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub async fn load(path: &Path) -> Result<Renderer, Error> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::TemplateLoad { path: path.to_owned(), source })?;
        Self::from_source(source)
            .map_err(|source| Error::TemplateSyntax { path: path.to_owned(), source })
    }

    pub fn from_source(source: String) -> Result<Renderer, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_name| AutoEscape::Html);
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Renderer { env })
    }

    pub fn render(&self, page: &Page) -> Result<String, Error> {
        let template = self.env.get_template(TEMPLATE_NAME).map_err(Error::Render)?;
        template.render(page).map_err(Error::Render)
    }
}

#[cfg(test)]
const TEST_TEMPLATE: &str = "<h1>{{ title }}</h1>\
<ul class=\"dirs\">{% for d in directories %}<li><a href=\"{{ d.url }}\">{{ d.name }}</a></li>{% endfor %}</ul>\
<table>{% for f in files %}<tr><td>{{ f.name }}</td><td>{{ f.size }}</td><td>{{ f.last_modified }}</td></tr>{% endfor %}</table>";

#[cfg(test)]
fn file_entry(name: &str) -> Entry {
    Entry {
        name: name.to_owned(),
        is_directory: false,
        size: Some("1.50 KB".to_owned()),
        last_modified: Some("2023-11-14 22:13 UTC".to_owned()),
        url: format!("/{name}"),
    }
}

#[test]
fn test_empty_listing_renders() {
    let renderer = Renderer::from_source(TEST_TEMPLATE.to_owned()).expect("template parses");
    let page = Page { title: "Index", bucket: "b", prefix: "", directories: &[], files: &[] };
    let html = renderer.render(&page).expect("renders");
    assert_eq!(html, "<h1>Index</h1><ul class=\"dirs\"></ul><table></table>");
}

#[test]
fn test_entries_rendered_in_order() {
    let renderer = Renderer::from_source(TEST_TEMPLATE.to_owned()).expect("template parses");
    let directories = [Entry { is_directory: true, size: None, last_modified: None, ..file_entry("a") }];
    let files = [file_entry("d.txt"), file_entry("e.txt")];
    let page = Page { title: "t", bucket: "b", prefix: "", directories: &directories, files: &files };
    let html = renderer.render(&page).expect("renders");
    let d = html.find("d.txt").expect("d.txt listed");
    let e = html.find("e.txt").expect("e.txt listed");
    assert!(html.find(">a<").expect("directory listed") < d);
    assert!(d < e);
    assert!(html.contains("1.50 KB"));
    assert!(html.contains("2023-11-14 22:13 UTC"));
}

#[test]
fn test_names_escaped() {
    let renderer = Renderer::from_source(TEST_TEMPLATE.to_owned()).expect("template parses");
    let files = [file_entry("<script>alert(1)</script>\".html")];
    let page = Page { title: "t", bucket: "b", prefix: "", directories: &[], files: &files };
    let html = renderer.render(&page).expect("renders");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("&quot;"));
}

#[test]
fn test_syntax_error_reported() {
    assert!(Renderer::from_source("{% for f in files %}".to_owned()).is_err());
}

#[tokio::test]
async fn test_missing_template_file() {
    let path = Path::new("does/not/exist/index.html.tmpl");
    match Renderer::load(path).await {
        Err(Error::TemplateLoad { path: reported, .. }) => assert_eq!(reported, path),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("template should not load"),
    }
}

#[tokio::test]
async fn test_shipped_template_renders() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(crate::config::DEFAULT_TEMPLATE);
    let renderer = Renderer::load(&path).await.expect("shipped template loads");
    let files = [file_entry("d.txt")];
    let page = Page { title: "Downloads", bucket: "b", prefix: "", directories: &[], files: &files };
    let html = renderer.render(&page).expect("renders");
    assert!(html.contains("Downloads"));
    assert!(html.contains("d.txt"));
}

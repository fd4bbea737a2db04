//! Splitting a flat key listing into one directory level.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::IndexConfig;
use crate::s3::ObjectSummary;
use crate::size::format_size;

mod seen_directories;

use seen_directories::SeenDirectories;

pub const INDEX_FILE_NAME: &str = "index.html";

/// A row of the rendered index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub is_directory: bool,
    pub size: Option<String>,
    pub last_modified: Option<String>,
    pub url: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<Entry>,
    pub files: Vec<Entry>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Index key for a normalized prefix
pub fn index_key(prefix: &str) -> String {
    if prefix.is_empty() {
        INDEX_FILE_NAME.to_owned()
    } else {
        format!("{prefix}/{INDEX_FILE_NAME}")
    }
}

/// Sorts keys below `prefix` into direct files and first-level directories,
/// one page at a time.
#[derive(Debug)]
pub struct Partitioner {
    /// `prefix/`, or empty at the bucket root
    key_prefix: String,
    index_key: String,
    base_url: String,
    recursive: bool,
    seen: SeenDirectories,
    listing: Listing,
}

impl Partitioner {
    /// `prefix` must already be normalized (no leading or trailing `/`)
    pub fn new(prefix: &str, base_url: &str, recursive: bool) -> Partitioner {
        let key_prefix = if prefix.is_empty() { String::new() } else { format!("{prefix}/") };
        Partitioner {
            key_prefix,
            index_key: index_key(prefix),
            base_url: base_url.to_owned(),
            recursive,
            seen: Default::default(),
            listing: Default::default(),
        }
    }

    pub fn for_config(config: &IndexConfig) -> Partitioner {
        Self::new(&config.prefix, &config.base_url, config.recursive)
    }

    pub fn add_page(&mut self, objects: &[ObjectSummary]) {
        for object in objects {
            self.add(object);
        }
    }

    pub fn add(&mut self, object: &ObjectSummary) {
        let key = object.key.as_str();
        if key == self.index_key {
            return;
        }
        let relative = match key.strip_prefix(self.key_prefix.as_str()) {
            Some("") | None => return,
            Some(relative) => relative,
        };
        if relative.starts_with('/') {
            tracing::debug!(key, "skipping key with an empty path segment below the prefix");
            return;
        }

        if self.recursive {
            if relative.ends_with('/') || Self::is_nested_index(relative) {
                return;
            }
        } else if relative.contains('/') {
            if let Some(directory) = self.seen.add_key(relative) {
                self.push_directory(directory);
            }
            return;
        }

        self.listing.files.push(Entry {
            name: relative.to_owned(),
            is_directory: false,
            size: Some(format_size(object.size)),
            last_modified: object.last_modified.as_ref().map(format_timestamp),
            url: self.url_for(key),
        });
    }

    pub fn finish(self) -> Listing {
        self.listing
    }

    fn push_directory(&mut self, directory: String) {
        let name = format!("{directory}/");
        let url = self.url_for(&format!("{}{name}", self.key_prefix));
        self.listing.directories.push(Entry {
            name,
            is_directory: true,
            size: None,
            last_modified: None,
            url,
        });
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn is_nested_index(relative: &str) -> bool {
        relative.rsplit_once('/').map(|(_, name)| name == INDEX_FILE_NAME).unwrap_or(false)
    }
}

#[cfg(test)]
fn object(key: &str, size: u64) -> ObjectSummary {
    ObjectSummary { key: key.to_owned(), size, last_modified: None }
}

#[cfg(test)]
fn names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn test_root_level() {
    let mut partitioner = Partitioner::new("", "", false);
    partitioner.add_page(&[object("a/b.txt", 1), object("a/c.txt", 2), object("d.txt", 1536)]);
    let listing = partitioner.finish();
    assert_eq!(names(&listing.directories), vec!["a/"]);
    assert_eq!(names(&listing.files), vec!["d.txt"]);
    assert_eq!(listing.files[0].size.as_deref(), Some("1.50 KB"));
    assert_eq!(listing.files[0].url, "/d.txt");
    assert_eq!(listing.directories[0].url, "/a/");
    assert!(listing.directories[0].size.is_none());
    assert!(listing.directories[0].last_modified.is_none());
}

#[test]
fn test_nested_prefix() {
    let mut partitioner = Partitioner::new("docs/v1", "https://files.example.com", false);
    partitioner.add_page(&[
        object("docs/v1/api/index.html", 10),
        object("docs/v1/readme.md", 20),
        object("docs/v1/api/types.html", 30),
        object("docs/v1/guide/intro/start.html", 40),
    ]);
    let listing = partitioner.finish();
    assert_eq!(names(&listing.directories), vec!["api/", "guide/"]);
    assert_eq!(listing.directories[1].url, "https://files.example.com/docs/v1/guide/");
    assert_eq!(names(&listing.files), vec!["readme.md"]);
    assert_eq!(listing.files[0].url, "https://files.example.com/docs/v1/readme.md");
}

#[test]
fn test_directories_deduplicated_across_pages() {
    let mut partitioner = Partitioner::new("", "", false);
    partitioner.add_page(&[object("x/1", 1), object("y/1", 1)]);
    partitioner.add_page(&[object("x/2", 1), object("x/deeper/3", 1), object("y/", 0)]);
    let listing = partitioner.finish();
    assert_eq!(names(&listing.directories), vec!["x/", "y/"]);
    assert!(listing.files.is_empty());
}

#[test]
fn test_own_index_excluded() {
    let mut partitioner = Partitioner::new("site", "", false);
    partitioner.add_page(&[object("site/index.html", 100), object("site/page.html", 100)]);
    assert_eq!(names(&partitioner.finish().files), vec!["page.html"]);

    let mut partitioner = Partitioner::new("", "", false);
    partitioner.add_page(&[object("index.html", 100)]);
    assert!(partitioner.finish().is_empty());
}

#[test]
fn test_lookalike_prefix_and_marker_skipped() {
    let mut partitioner = Partitioner::new("foo", "", false);
    partitioner.add_page(&[object("foo/", 0), object("foobar.txt", 1), object("foo", 1), object("foo/bar.txt", 1)]);
    let listing = partitioner.finish();
    assert!(listing.directories.is_empty());
    assert_eq!(names(&listing.files), vec!["bar.txt"]);
}

#[test]
fn test_recursive_lists_nested_files_flat() {
    let mut partitioner = Partitioner::new("data", "", true);
    partitioner.add_page(&[
        object("data/index.html", 1),
        object("data/a.csv", 1),
        object("data/2024/", 0),
        object("data/2024/index.html", 1),
        object("data/2024/b.csv", 1),
    ]);
    let listing = partitioner.finish();
    assert!(listing.directories.is_empty());
    assert_eq!(names(&listing.files), vec!["a.csv", "2024/b.csv"]);
    assert_eq!(listing.files[1].url, "/data/2024/b.csv");
}

#[test]
fn test_empty_segment_skipped_in_both_modes() {
    for recursive in [false, true] {
        let mut partitioner = Partitioner::new("", "", recursive);
        partitioner.add_page(&[object("/x.txt", 1), object("/nested/w.txt", 1)]);
        assert!(partitioner.finish().is_empty(), "recursive={recursive}");

        let mut partitioner = Partitioner::new("docs", "", recursive);
        partitioner.add_page(&[object("docs//y.txt", 1), object("docs/z.txt", 1)]);
        let listing = partitioner.finish();
        assert!(listing.directories.is_empty(), "recursive={recursive}");
        assert_eq!(names(&listing.files), vec!["z.txt"], "recursive={recursive}");
    }
}

#[test]
fn test_timestamp_format() {
    let time = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
    assert_eq!(format_timestamp(&time), "2023-11-14 22:13 UTC");

    let mut partitioner = Partitioner::new("", "", false);
    partitioner.add(&ObjectSummary { key: "f".to_owned(), size: 3, last_modified: Some(time) });
    let listing = partitioner.finish();
    assert_eq!(listing.files[0].last_modified.as_deref(), Some("2023-11-14 22:13 UTC"));
    assert_eq!(listing.files[0].size.as_deref(), Some("3 B"));
}

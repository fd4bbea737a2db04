#[derive (Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub bucket: String,
    pub key: String,
}

impl Uri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Uri {
        Uri { bucket: bucket.into(), key: key.into() }
    }
    pub fn filename(&self) -> Option<&str> {
        match self.key.rsplit_once('/') {
            None if !self.key.is_empty() => Some(&self.key),
            None => None,
            Some((_, "")) => None,
            Some((_, filename)) => Some(filename),
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[test]
fn test_display() {
    assert_eq!(Uri::new("bucket", "docs/").to_string(), "s3://bucket/docs/");
    assert_eq!(Uri::new("bucket", "").to_string(), "s3://bucket/");
}

#[test]
fn test_filename() {
    assert_eq!(Uri::new("b", "docs/index.html").filename(), Some("index.html"));
    assert_eq!(Uri::new("b", "index.html").filename(), Some("index.html"));
    assert_eq!(Uri::new("b", "docs/").filename(), None);
    assert_eq!(Uri::new("b", "").filename(), None);
}

/// Directory names in the order they were first seen.
///
/// Membership is a linear scan; a listing level holds few enough
/// subdirectories that a set buys nothing.
#[derive(Debug, Default)]
pub struct SeenDirectories {
    seen: Vec<String>,
}

fn first_segment(relative: &str) -> Option<&str> {
    relative.split_once('/').map(|(segment, _below)| segment)
}

impl SeenDirectories {
    #[must_use]
    /// Returns the directory `relative` introduces, if not seen before.
    /// Keys without a `/` introduce no directory.
    pub fn add_key(&mut self, relative: &str) -> Option<String> {
        let segment = first_segment(relative)?;
        if segment.is_empty() || self.seen.iter().any(|d| d == segment) {
            return None;
        }
        self.seen.push(segment.to_owned());
        Some(segment.to_owned())
    }
}

#[test]
fn test_first_seen_once() {
    let mut seen = SeenDirectories::default();
    assert_eq!(seen.add_key("base/first/second/file.txt"), Some("base".to_string()));
    assert_eq!(seen.add_key("base/other.txt"), None);
    assert_eq!(seen.add_key("base2/pic.jpg"), Some("base2".to_string()));
    assert_eq!(seen.add_key("base/first/"), None);
    assert_eq!(seen.seen, vec!["base", "base2"]);
}

#[test]
fn test_plain_files_introduce_nothing() {
    let mut seen = SeenDirectories::default();
    assert_eq!(seen.add_key("file.txt"), None);
    assert_eq!(seen.add_key("/leading-slash"), None);
    assert!(seen.seen.is_empty());
}

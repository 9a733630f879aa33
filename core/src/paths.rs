//! Classify changed files as tests, sources or neither.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Test,
    Source,
    Other,
}

/// Directory and naming conventions of a repository.
///
/// A test file lives under a directory whose name starts with
/// `test_dir_prefix`, has `test_name_marker` in its file name and one of
/// `extensions`. A source file lives under a directory starting with
/// `source_dir_prefix` and has one of `extensions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileLayout {
    pub test_dir_prefix: String,
    pub test_name_marker: String,
    pub source_dir_prefix: String,
    pub extensions: Vec<String>,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            test_dir_prefix: "test".to_owned(),
            test_name_marker: "spec".to_owned(),
            source_dir_prefix: "src".to_owned(),
            extensions: vec!["js".to_owned()],
        }
    }
}

impl FileLayout {
    pub fn is_test_file(&self, path: &str) -> bool {
        let (dirs, file_name) = split_path(path);
        dirs.iter().any(|d| d.starts_with(&self.test_dir_prefix))
            && file_name.contains(&self.test_name_marker)
            && self.has_extension(file_name)
    }

    pub fn is_source_file(&self, path: &str) -> bool {
        let (dirs, file_name) = split_path(path);
        dirs.iter().any(|d| d.starts_with(&self.source_dir_prefix)) && self.has_extension(file_name)
    }

    /// Tests win when a path qualifies as both.
    pub fn role(&self, path: &str) -> FileRole {
        if self.is_test_file(path) {
            FileRole::Test
        } else if self.is_source_file(path) {
            FileRole::Source
        } else {
            FileRole::Other
        }
    }

    fn has_extension(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.iter().any(|e| e == ext))
    }
}

fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = path.split('/').collect();
    let file_name = parts.pop().unwrap_or_default();
    (parts, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_file_detection() {
        let layout = FileLayout::default();
        assert!(layout.is_test_file("test/unit/parser.spec.js"));
        assert!(layout.is_test_file("packages/core/tests/math.spec.js"));
        assert!(!layout.is_test_file("test/helpers.js"));
        assert!(!layout.is_test_file("spec/parser.spec.js"));
        assert!(!layout.is_test_file("parser.spec.js"));
        assert!(!layout.is_test_file("test/parser.spec.ts"));
    }

    #[test]
    fn test_source_file_detection() {
        let layout = FileLayout::default();
        assert!(layout.is_source_file("src/index.js"));
        assert!(layout.is_source_file("lib/src/deep/util.js"));
        assert!(!layout.is_source_file("src/index.jsx"));
        assert!(!layout.is_source_file("index.js"));
    }

    #[test]
    fn test_roles() {
        let layout = FileLayout::default();
        assert_eq!(layout.role("src/test/a.spec.js"), FileRole::Test);
        assert_eq!(layout.role("src/a.js"), FileRole::Source);
        assert_eq!(layout.role("README.md"), FileRole::Other);
    }

    #[test]
    fn test_layout_from_json() {
        let layout: FileLayout =
            serde_json::from_str(r#"{"testNameMarker":"test","extensions":["js","ts"]}"#).unwrap();
        assert_eq!(layout.test_dir_prefix, "test");
        assert!(layout.is_test_file("tests/a.test.ts"));
    }
}

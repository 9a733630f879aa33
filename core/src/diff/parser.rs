use crate::error::MalformedHunk;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `@@ -old_start[,old_count] +new_start[,new_count] @@ optional context`
static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

static EDITED_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\+\+\+ b/(.+?)\r?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Added,
    Removed,
}

/// One added or removed line. Added lines are numbered in the post-image,
/// removed lines in the pre-image (both 1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    #[serde(rename = "lineNumber")]
    pub line_number: usize,
    pub text: String,
    pub kind: EditKind,
}

/// Edits recovered from a single-file unified diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDiff {
    pub added: Vec<LineEdit>,
    pub removed: Vec<LineEdit>,
    /// Headers that could not be parsed; their hunks were skipped
    pub malformed: Vec<MalformedHunk>,
}

impl ParsedDiff {
    /// Post-image line numbers of every added line.
    pub fn added_lines(&self) -> BTreeSet<usize> {
        self.added.iter().map(|e| e.line_number).collect()
    }

    /// Pre-image line numbers of every removed line.
    pub fn removed_lines(&self) -> BTreeSet<usize> {
        self.removed.iter().map(|e| e.line_number).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HunkHeader {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
}

/// One file's section of a multi-file diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    /// `None` for created files
    pub old_path: Option<String>,
    /// `None` for deleted files
    pub new_path: Option<String>,
    pub text: String,
}

impl FileDiff {
    /// The path this section is best known by.
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}

/// Parse the hunks of a single-file unified diff into added and removed lines.
///
/// A line starting with `@@` that is not a valid header is recorded as
/// malformed and everything up to the next valid header is ignored.
pub fn parse_hunks(diff: &str) -> ParsedDiff {
    let mut parsed = ParsedDiff::default();
    let mut cursor: Option<HunkCursor> = None;

    for (idx, line) in diff.lines().enumerate() {
        if line.starts_with("@@") {
            cursor = match parse_hunk_header(line) {
                Some(header) => Some(HunkCursor::new(header)),
                None => {
                    debug!("[diff] skipping malformed hunk header at line {}: {line}", idx + 1);
                    parsed.malformed.push(MalformedHunk {
                        diff_line: idx + 1,
                        header: line.to_owned(),
                    });
                    None
                }
            };
            continue;
        }

        let Some(ref mut hunk) = cursor else {
            continue;
        };

        if line.starts_with('+') && !line.starts_with("+++") {
            hunk.new_line += 1;
            parsed.added.push(LineEdit {
                line_number: hunk.new_line,
                text: line[1..].to_owned(),
                kind: EditKind::Added,
            });
        } else if line.starts_with('-') && !line.starts_with("---") {
            hunk.old_line += 1;
            parsed.removed.push(LineEdit {
                line_number: hunk.old_line,
                text: line[1..].to_owned(),
                kind: EditKind::Removed,
            });
        } else if line.starts_with('\\') {
            // "\ No newline at end of file" belongs to neither side
        } else {
            hunk.old_line += 1;
            hunk.new_line += 1;
        }
    }

    parsed
}

/// Split a multi-file diff on `diff --git` boundaries.
///
/// A diff without any `diff --git` line is returned as a single section.
pub fn split_by_file(diff: &str) -> Vec<FileDiff> {
    let mut sections: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in diff.lines() {
        if line.starts_with("diff --git ") && !current.is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }

    sections.into_iter().map(file_diff_from_section).collect()
}

/// Paths of every file a diff writes to (`+++ b/<path>` lines).
pub fn edited_files(diff: &str) -> Vec<String> {
    EDITED_FILE
        .captures_iter(diff)
        .map(|c| c[1].to_owned())
        .collect()
}

fn file_diff_from_section(text: String) -> FileDiff {
    let mut old_path = None;
    let mut new_path = None;
    let mut saw_old = false;
    let mut saw_new = false;

    for line in text.lines() {
        if line.starts_with("@@") {
            break;
        }
        if let Some(path) = line.strip_prefix("--- ") {
            saw_old = true;
            old_path = strip_side_prefix(path, "a/");
        } else if let Some(path) = line.strip_prefix("+++ ") {
            saw_new = true;
            new_path = strip_side_prefix(path, "b/");
        }
    }

    // Sections without ---/+++ lines (renames, binary files) only name paths in the git header
    if !saw_old && !saw_new {
        if let Some((a, b)) = text.lines().next().and_then(parse_git_header) {
            old_path = Some(a);
            new_path = Some(b);
        }
    }

    FileDiff {
        old_path,
        new_path,
        text,
    }
}

fn strip_side_prefix(path: &str, prefix: &str) -> Option<String> {
    let path = path.split('\t').next().unwrap_or(path).trim_end();
    if path == "/dev/null" {
        return None;
    }
    Some(path.strip_prefix(prefix).unwrap_or(path).to_owned())
}

fn parse_git_header(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("diff --git a/")?;
    let (a, b) = rest.split_once(" b/")?;
    Some((a.to_owned(), b.to_owned()))
}

pub(crate) fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let caps = HUNK_HEADER.captures(line)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<usize>().ok());
    Some(HunkHeader {
        old_start: number(1)?,
        old_count: number(2).unwrap_or(1),
        new_start: number(3)?,
        new_count: number(4).unwrap_or(1),
    })
}

/// Running line counters inside one hunk. Each counter holds the number of
/// the last line consumed on its side.
struct HunkCursor {
    old_line: usize,
    new_line: usize,
}

impl HunkCursor {
    fn new(header: HunkHeader) -> Self {
        Self {
            old_line: header.old_start.saturating_sub(1),
            new_line: header.new_start.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hunk_header() {
        let header = parse_hunk_header("@@ -1,5 +1,7 @@ fn main() {").unwrap();
        assert_eq!(
            header,
            HunkHeader {
                old_start: 1,
                old_count: 5,
                new_start: 1,
                new_count: 7,
            }
        );

        let single = parse_hunk_header("@@ -3 +4 @@").unwrap();
        assert_eq!(single.old_count, 1);
        assert_eq!(single.new_start, 4);

        assert!(parse_hunk_header("@@ bad @@").is_none());
        assert!(parse_hunk_header("@@ -a,1 +2 @@").is_none());
    }

    #[test]
    fn test_parse_hunks_line_arithmetic() {
        let diff = "\
--- a/f.js
+++ b/f.js
@@ -5,2 +5,3 @@
 keep
-old
+new one
+new two
";
        let parsed = parse_hunks(diff);
        assert_eq!(
            parsed.added,
            vec![
                LineEdit {
                    line_number: 6,
                    text: "new one".to_owned(),
                    kind: EditKind::Added,
                },
                LineEdit {
                    line_number: 7,
                    text: "new two".to_owned(),
                    kind: EditKind::Added,
                },
            ]
        );
        assert_eq!(
            parsed.removed,
            vec![LineEdit {
                line_number: 6,
                text: "old".to_owned(),
                kind: EditKind::Removed,
            }]
        );
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn test_removal_before_additions_shares_start_line() {
        let parsed = parse_hunks("@@ -5,2 +5,3 @@\n-old\n+new1\n+new2\n context\n");
        assert_eq!(parsed.added_lines(), BTreeSet::from([5, 6]));
        assert_eq!(parsed.removed_lines(), BTreeSet::from([5]));
        assert_eq!(parsed.removed[0].text, "old");
    }

    #[test]
    fn test_each_hunk_resets_counters() {
        let diff = "\
@@ -1,1 +1,2 @@
 a
+b
@@ -10,2 +11,1 @@
 x
-y
";
        let parsed = parse_hunks(diff);
        assert_eq!(parsed.added_lines(), BTreeSet::from([2]));
        assert_eq!(parsed.removed_lines(), BTreeSet::from([11]));
    }

    #[test]
    fn test_malformed_hunk_is_skipped() {
        let diff = "\
@@ bad @@
+ignored
-ignored too
@@ -1,1 +1,2 @@
 a
+kept
";
        let parsed = parse_hunks(diff);
        assert_eq!(parsed.added.len(), 1);
        assert_eq!(parsed.added[0].text, "kept");
        assert_eq!(parsed.added[0].line_number, 2);
        assert!(parsed.removed.is_empty());
        assert_eq!(
            parsed.malformed,
            vec![MalformedHunk {
                diff_line: 1,
                header: "@@ bad @@".to_owned(),
            }]
        );
    }

    #[test]
    fn test_no_newline_marker_is_ignored() {
        let diff = "\
@@ -1,2 +1,2 @@
 a
-b
\\ No newline at end of file
+c
";
        let parsed = parse_hunks(diff);
        assert_eq!(parsed.removed_lines(), BTreeSet::from([2]));
        assert_eq!(parsed.added_lines(), BTreeSet::from([2]));
    }

    #[test]
    fn test_split_by_file() {
        let diff = "\
diff --git a/src/a.js b/src/a.js
--- a/src/a.js
+++ b/src/a.js
@@ -1 +1 @@
-x
+y
diff --git a/test/new.spec.js b/test/new.spec.js
new file mode 100644
--- /dev/null
+++ b/test/new.spec.js
@@ -0,0 +1 @@
+it(\"works\", () => {});
diff --git a/old.js b/old.js
deleted file mode 100644
--- a/old.js
+++ /dev/null
@@ -1 +0,0 @@
-gone
";
        let files = split_by_file(diff);
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].old_path.as_deref(), Some("src/a.js"));
        assert_eq!(files[0].new_path.as_deref(), Some("src/a.js"));
        assert!(files[0].text.starts_with("diff --git a/src/a.js"));

        assert_eq!(files[1].old_path, None);
        assert_eq!(files[1].path(), Some("test/new.spec.js"));
        assert_eq!(parse_hunks(&files[1].text).added_lines(), BTreeSet::from([1]));

        assert_eq!(files[2].new_path, None);
        assert_eq!(files[2].path(), Some("old.js"));
    }

    #[test]
    fn test_split_rename_without_hunks() {
        let diff = "\
diff --git a/lib/x.js b/lib/y.js
similarity index 100%
rename from lib/x.js
rename to lib/y.js
";
        let files = split_by_file(diff);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].old_path.as_deref(), Some("lib/x.js"));
        assert_eq!(files[0].new_path.as_deref(), Some("lib/y.js"));
    }

    #[test]
    fn test_edited_files() {
        let diff = "\
--- a/src/a.js
+++ b/src/a.js
@@ -1 +1 @@
-x
+y
--- a/test/a.spec.js
+++ b/test/a.spec.js
";
        assert_eq!(edited_files(diff), vec!["src/a.js", "test/a.spec.js"]);
    }
}

//! Produce git-style unified diffs between two texts.

use similar::TextDiff;

/// Lines of context around each change.
pub const CONTEXT_LINES: usize = 3;

/// Git-style unified diff of `before` → `after` for `path`.
///
/// Returns an empty string when the texts are identical.
pub fn unified_diff(before: &str, after: &str, path: &str) -> String {
    if before == after {
        return String::new();
    }

    let old_name = format!("a/{path}");
    let new_name = format!("b/{path}");
    let diff = TextDiff::from_lines(before, after);
    let body = diff
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&old_name, &new_name)
        .to_string();

    format!("diff --git {old_name} {new_name}\n{body}")
}

/// Whether the two texts differ in at least one line.
pub fn lines_differ(before: &str, after: &str) -> bool {
    TextDiff::from_lines(before, after)
        .ops()
        .iter()
        .any(|op| !matches!(op, similar::DiffOp::Equal { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::apply::apply_hunks;
    use crate::diff::parser::{parse_hunks, split_by_file};

    #[test]
    fn test_unified_diff_has_git_header() {
        let patch = unified_diff("a\nb\nc\n", "a\nB\nc\n", "src/x.js");
        assert!(patch.starts_with("diff --git a/src/x.js b/src/x.js\n--- a/src/x.js\n+++ b/src/x.js\n"));
        assert!(patch.contains("-b\n+B\n"));
    }

    #[test]
    fn test_identical_texts_produce_no_patch() {
        assert_eq!(unified_diff("same\n", "same\n", "x.js"), "");
    }

    #[test]
    fn test_rendered_patch_applies_back() {
        let before = "one\ntwo\nthree\nfour\nfive\nsix\nseven\neight\n";
        let after = "one\ntwo\n3\nfour\nfive\nsix\nseven\neight\nnine\n";
        let patch = unified_diff(before, after, "n.js");

        let files = split_by_file(&patch);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path(), Some("n.js"));
        assert_eq!(apply_hunks(before, &patch).unwrap(), after);

        let parsed = parse_hunks(&patch);
        assert_eq!(
            parsed.added_lines().into_iter().collect::<Vec<_>>(),
            vec![3, 9]
        );
    }

    #[test]
    fn test_lines_differ() {
        assert!(!lines_differ("a\nb\n", "a\nb\n"));
        assert!(lines_differ("a\nb\n", "a\nc\n"));
    }
}

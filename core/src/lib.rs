//! Diff-driven structural tools for JavaScript sources.
//!
//! * [`slice_file`] reduces a file to the declarations a diff touched.
//! * [`detect_changed_tests`] lists the test cases that are new or modified
//!   between two revisions of a test file.
//! * [`inject_fragment`] appends generated code at the end of a file or
//!   inside its trailing test suite.
//! * [`line_scope_of`] reports the function/class scope enclosing a line.

pub mod diff;
pub mod error;
pub mod inject;
pub mod paths;
pub mod scope;
pub mod slice;
pub mod syntax;
pub mod testcases;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, InjectError, MalformedHunk, ParseFailure, PatchError};
pub use scope::{ChangeSet, ScopeMap, ScopePath};
pub use slice::{Annotation, Revision, SliceOptions};
pub use syntax::{SourceLanguage, SyntaxTree};
pub use testcases::TestSyntax;

use log::{debug, warn};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Why a slice fell back to returning the file unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Degradation {
    /// The revision to slice could not be parsed
    Unparseable(ParseFailure),
    /// The post-image was requested but could not be rebuilt from the diff
    MissingPostImage(PatchError),
}

/// Result of slicing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceOutcome {
    pub text: String,
    pub change_set: ChangeSet,
    /// Removed lines for [`Revision::Pre`], added lines for [`Revision::Post`]
    pub edited_lines: BTreeSet<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<Degradation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<MalformedHunk>,
}

/// Slice the pre-image of `filename` down to what `diff` touched, with
/// line-number annotations. Unparseable files come back unchanged.
pub fn slice_file(before_text: &str, diff_text: &str, filename: &str) -> String {
    slice_file_with(
        before_text,
        None,
        diff_text,
        filename,
        &SliceOptions::default(),
    )
    .text
}

/// Slice one revision of `filename` down to what `diff` touched.
///
/// The change-set is the union of removed lines located in the pre-image and
/// added lines located in the post-image. When `after_text` is `None` the
/// post-image is rebuilt by applying `diff` to `before_text`; if that fails
/// only the pre-image contributes.
pub fn slice_file_with(
    before_text: &str,
    after_text: Option<&str>,
    diff_text: &str,
    filename: &str,
    options: &SliceOptions,
) -> SliceOutcome {
    let parsed = diff::parse_hunks(diff_text);

    let (after, patch_error): (Option<Cow<'_, str>>, Option<PatchError>) = match after_text {
        Some(text) => (Some(Cow::Borrowed(text)), None),
        None => match diff::apply_hunks(before_text, diff_text) {
            Ok(text) => (Some(Cow::Owned(text)), None),
            Err(e) => {
                debug!("[slice] could not rebuild post-image of {filename}: {e}");
                (None, Some(e))
            }
        },
    };

    let before_tree = SyntaxTree::parse_path(before_text, filename);
    let after_tree = after
        .as_deref()
        .map(|text| SyntaxTree::parse_path(text, filename));

    let change_set = scope::locate_edits(
        before_tree.as_ref().ok(),
        after_tree.as_ref().and_then(|t| t.as_ref().ok()),
        &parsed,
    );
    debug!(
        "[slice] {filename}: {} functions, {} classes touched",
        change_set.global_functions.len(),
        change_set.class_methods.len()
    );

    let (text, tree, edited_lines) = match options.revision {
        Revision::Pre => (before_text, Some(before_tree), parsed.removed_lines()),
        Revision::Post => (
            after.as_deref().unwrap_or(before_text),
            after_tree,
            parsed.added_lines(),
        ),
    };

    let degraded = match &tree {
        None => patch_error.map(Degradation::MissingPostImage),
        Some(Err(failure)) => Some(Degradation::Unparseable(failure.clone())),
        Some(Ok(_)) => None,
    };

    let sliced = match (&tree, &degraded) {
        (Some(Ok(tree)), None) => {
            slice::slice(tree, &change_set).render(options.annotation, &edited_lines)
        }
        _ => {
            warn!("[slice] returning {filename} unsliced: {degraded:?}");
            text.to_owned()
        }
    };

    SliceOutcome {
        text: sliced,
        change_set,
        edited_lines,
        degraded,
        malformed: parsed.malformed,
    }
}

/// One file's slice within a multi-file patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSlice {
    pub path: String,
    #[serde(flatten)]
    pub outcome: SliceOutcome,
}

/// Slice every file of a multi-file diff whose pre-image is in `sources`.
///
/// Created files slice an empty pre-image; files missing from `sources` are
/// skipped.
pub fn slice_patch(
    sources: &BTreeMap<String, String>,
    diff_text: &str,
    options: &SliceOptions,
) -> Vec<FileSlice> {
    diff::split_by_file(diff_text)
        .into_iter()
        .filter_map(|file| {
            let path = file.path()?.to_owned();
            let before = match (sources.get(&path), &file.old_path) {
                (Some(text), _) => text.as_str(),
                (None, None) => "",
                (None, Some(_)) => {
                    debug!("[slice] no pre-image supplied for {path}, skipping");
                    return None;
                }
            };
            let outcome = slice_file_with(before, None, &file.text, &path, options);
            Some(FileSlice { path, outcome })
        })
        .collect()
}

/// Qualified names of the test cases that are new or modified in
/// `after_text` compared to `before_text` (JavaScript, `describe`/`it`).
pub fn detect_changed_tests(
    before_text: &str,
    after_text: &str,
) -> Result<Vec<String>, ParseFailure> {
    detect_changed_tests_with(
        before_text,
        after_text,
        SourceLanguage::JavaScript,
        &TestSyntax::default(),
    )
}

pub fn detect_changed_tests_with(
    before_text: &str,
    after_text: &str,
    language: SourceLanguage,
    syntax: &TestSyntax,
) -> Result<Vec<String>, ParseFailure> {
    let changes = testcases::detect_changes(before_text, after_text, language, syntax)?;
    Ok(changes.into_iter().map(|c| c.qualified_name).collect())
}

/// Append `fragment_text` after the last top-level statement of a
/// JavaScript file, or inside its trailing `describe` block.
pub fn inject_fragment(file_text: &str, fragment_text: &str) -> Result<String, InjectError> {
    inject::inject(
        file_text,
        fragment_text,
        SourceLanguage::JavaScript,
        &TestSyntax::default(),
    )
}

/// Scope enclosing 1-indexed `line_number` of `tree`.
pub fn line_scope_of(tree: &SyntaxTree, line_number: usize) -> ScopePath {
    ScopeMap::build(tree).scope_of(line_number).clone()
}

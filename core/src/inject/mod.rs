//! Splice a code fragment into a file at a structurally sensible place.
//!
//! The anchor is the last top-level statement. When that statement is a
//! suite call, the anchor moves to the last call inside the suite so the
//! fragment lands within it. The fragment is re-indented to the anchor's
//! indentation and inserted after it, preceded by one blank line.

use crate::error::InjectError;
use crate::syntax::{SourceLanguage, SyntaxKind, SyntaxNode, SyntaxTree};
use crate::testcases::{clean_description, TestSyntax};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionMode {
    /// After the last top-level statement
    AppendToFile,
    /// After the last call inside the trailing suite
    AppendToLastBlock,
    /// After the last call inside a suite picked by description
    AppendToNamedBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionPoint {
    /// 0-indexed line before which the fragment is inserted
    pub line_index: usize,
    /// Exact leading whitespace of the anchor's first line
    pub indent: String,
    pub mode: InjectionMode,
}

/// Where a fragment appended to `tree` would go.
pub fn find_insertion_point(
    tree: &SyntaxTree,
    syntax: &TestSyntax,
) -> Result<InjectionPoint, InjectError> {
    let anchor = tree
        .root_children()
        .into_iter()
        .rev()
        .find(|node| node.kind() != SyntaxKind::Comment)
        .ok_or(InjectError::NoInsertionPoint)?;

    if !is_suite(anchor, syntax) {
        return Ok(point_after(tree, anchor, InjectionMode::AppendToFile));
    }

    let last_call = last_call_in(anchor).ok_or_else(|| InjectError::EmptySuite {
        suite: suite_description(anchor),
    })?;
    Ok(point_after(tree, last_call, InjectionMode::AppendToLastBlock))
}

/// Where a fragment appended to the top-level suite described as `suite` would go.
pub fn find_suite_insertion_point(
    tree: &SyntaxTree,
    syntax: &TestSyntax,
    suite: &str,
) -> Result<InjectionPoint, InjectError> {
    let target = tree
        .root_children()
        .into_iter()
        .find(|node| is_suite(*node, syntax) && suite_description(*node) == suite)
        .ok_or_else(|| InjectError::SuiteNotFound {
            suite: suite.to_owned(),
        })?;

    let last_call = last_call_in(target).ok_or_else(|| InjectError::EmptySuite {
        suite: suite.to_owned(),
    })?;
    Ok(point_after(tree, last_call, InjectionMode::AppendToNamedBlock))
}

/// Insert `fragment` at `point`. The fragment is dedented first, then each
/// non-blank line gets the point's indentation. A source using `\r\n` keeps
/// `\r\n` throughout, inserted lines included.
pub fn splice(source: &str, point: &InjectionPoint, fragment: &str) -> String {
    let fragment = dedent(fragment);
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let lines: Vec<&str> = source.lines().collect();
    let at = point.line_index.min(lines.len());

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + fragment.lines().count() + 1);
    out.extend(lines[..at].iter().map(|l| (*l).to_owned()));
    out.push(String::new());
    out.extend(fragment.lines().map(|line| {
        if line.trim().is_empty() {
            String::new()
        } else {
            format!("{}{line}", point.indent)
        }
    }));
    out.extend(lines[at..].iter().map(|l| (*l).to_owned()));

    let mut result = out.join(newline);
    if source.ends_with('\n') {
        result.push_str(newline);
    }
    result
}

/// Remove the indentation of the first non-blank line from every line.
/// Blank lines become empty.
pub fn dedent(text: &str) -> String {
    let Some(first) = text.lines().find(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let prefix = leading_whitespace(first);

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else if let Some(rest) = line.strip_prefix(prefix) {
                rest
            } else {
                // Less indented than the first line: drop what whitespace there is
                line.trim_start()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append `fragment` to `file_text` after its last top-level statement (or
/// inside its trailing suite).
pub fn inject(
    file_text: &str,
    fragment: &str,
    language: SourceLanguage,
    syntax: &TestSyntax,
) -> Result<String, InjectError> {
    let tree = SyntaxTree::parse(file_text, language)?;
    let point = find_insertion_point(&tree, syntax)?;
    debug!(
        "[inject] {:?} at line {} with indent {:?}",
        point.mode,
        point.line_index + 1,
        point.indent
    );
    Ok(splice(file_text, &point, fragment))
}

/// Append `fragment` inside the top-level suite described as `suite`.
pub fn inject_into_suite(
    file_text: &str,
    fragment: &str,
    suite: &str,
    language: SourceLanguage,
    syntax: &TestSyntax,
) -> Result<String, InjectError> {
    let tree = SyntaxTree::parse(file_text, language)?;
    let point = find_suite_insertion_point(&tree, syntax, suite)?;
    debug!("[inject] into suite {suite:?} at line {}", point.line_index + 1);
    Ok(splice(file_text, &point, fragment))
}

fn is_suite(node: SyntaxNode, syntax: &TestSyntax) -> bool {
    node.callee()
        .is_some_and(|callee| syntax.suite_callees.iter().any(|s| s == callee))
}

fn suite_description(node: SyntaxNode) -> String {
    clean_description(node.description_literal().unwrap_or("<describe>"))
}

fn last_call_in(suite: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    suite
        .callback_body()
        .into_iter()
        .rev()
        .find(|node| node.kind() == SyntaxKind::CallExpression)
}

fn point_after(tree: &SyntaxTree, anchor: SyntaxNode, mode: InjectionMode) -> InjectionPoint {
    let indent = tree
        .source()
        .lines()
        .nth(anchor.start_row())
        .map(leading_whitespace)
        .unwrap_or_default()
        .to_owned();
    InjectionPoint {
        line_index: anchor.end_row() + 1,
        indent,
        mode,
    }
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

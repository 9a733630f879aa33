//! Structural slicing: keep only the declarations a change touched.
//!
//! Every visited node yields an ordered list of line marks. Marks are applied
//! in order over a per-line mask, so a later mark (a child, an attached
//! decorator) overrides an earlier one (its parent, a skipped sibling).
//! Lines no node covers stay kept.

pub mod decorators;
pub mod leading;

pub use leading::slice_leading_definitions;

use crate::scope::ChangeSet;
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Which revision of a changed file gets sliced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    /// The file before the change; removed lines count as edited
    #[default]
    Pre,
    /// The file after the change; added lines count as edited
    Post,
}

/// How kept lines are prefixed in the rendered slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Annotation {
    /// `"<line> <text>"`
    #[default]
    LineNumbers,
    /// `"+<text>"` for edited lines, `" <text>"` otherwise
    EditMarkers,
    /// Lines verbatim
    Plain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceOptions {
    pub revision: Revision,
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    Keep,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineMark {
    pub lines: RangeInclusive<usize>,
    pub mark: Mark,
}

impl LineMark {
    pub(crate) fn keep(lines: RangeInclusive<usize>) -> Self {
        Self {
            lines,
            mark: Mark::Keep,
        }
    }

    pub(crate) fn skip(lines: RangeInclusive<usize>) -> Self {
        Self {
            lines,
            mark: Mark::Skip,
        }
    }
}

/// A kept source line with its original 1-indexed number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlicedLine {
    pub number: usize,
    pub text: String,
}

/// Surviving lines of a slice, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SliceResult {
    pub lines: Vec<SlicedLine>,
}

impl SliceResult {
    /// Apply `marks` in order over a mask where unmarked lines take `default`.
    /// Line terminators, `\r\n` included, are stripped from the kept text.
    pub(crate) fn from_marks(source: &str, marks: &[LineMark], default: Mark) -> Self {
        let mut mask = vec![default; source.lines().count()];
        for mark in marks {
            for line in mark.lines.clone() {
                if let Some(slot) = line.checked_sub(1).and_then(|idx| mask.get_mut(idx)) {
                    *slot = mark.mark;
                }
            }
        }

        let lines = source
            .lines()
            .zip(mask)
            .enumerate()
            .filter(|(_, (_, mark))| *mark == Mark::Keep)
            .map(|(idx, (text, _))| SlicedLine {
                number: idx + 1,
                text: text.to_owned(),
            })
            .collect();
        Self { lines }
    }

    pub fn line_numbers(&self) -> Vec<usize> {
        self.lines.iter().map(|l| l.number).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render the kept lines, drop decorators whose declaration was sliced
    /// away and collapse runs of blank lines.
    ///
    /// Lines are joined with `\n` whatever the source used; a CRLF file
    /// renders with LF endings. `edited` is only consulted for
    /// [`Annotation::EditMarkers`].
    pub fn render(&self, annotation: Annotation, edited: &BTreeSet<usize>) -> String {
        let annotated: Vec<String> = self
            .lines
            .iter()
            .map(|line| match annotation {
                Annotation::LineNumbers => format!("{} {}", line.number, line.text),
                Annotation::EditMarkers => {
                    let marker = if edited.contains(&line.number) { '+' } else { ' ' };
                    format!("{marker}{}", line.text)
                }
                Annotation::Plain => line.text.clone(),
            })
            .collect();

        let filtered = decorators::filter_stray_decorators(&annotated);
        decorators::collapse_blank_runs(&filtered.join("\n"), annotation)
    }
}

/// Slice `tree` down to the declarations named in `change_set`.
///
/// Imports and top-level variable declarations always survive, as do
/// non-doc comments. Functions and classes survive when the change-set
/// names them; inside a surviving class, fields and the constructor always
/// survive and other methods only when named.
pub fn slice(tree: &SyntaxTree, change_set: &ChangeSet) -> SliceResult {
    let mut marks = Vec::new();
    for node in tree.root_children() {
        let keep = keep_top_level(node, change_set);
        marks.extend(mark_node(node, keep, change_set));
    }
    SliceResult::from_marks(tree.source(), &marks, Mark::Keep)
}

fn keep_top_level(node: SyntaxNode, change_set: &ChangeSet) -> bool {
    match node.kind() {
        SyntaxKind::Import | SyntaxKind::VariableDecl => true,
        SyntaxKind::FunctionDecl => node.name().is_some_and(|n| change_set.keeps_function(n)),
        SyntaxKind::ClassDecl => node.name().is_some_and(|n| change_set.keeps_class(n)),
        SyntaxKind::Comment => !node.is_doc_comment(),
        _ => false,
    }
}

fn keep_class_member(node: SyntaxNode, class: &str, change_set: &ChangeSet) -> bool {
    match node.kind() {
        SyntaxKind::VariableDecl | SyntaxKind::FieldDecl => true,
        SyntaxKind::Comment => !node.is_doc_comment(),
        SyntaxKind::MethodDef => match node.name() {
            Some("constructor") => true,
            Some(name) => change_set.keeps_method(class, name),
            None => false,
        },
        _ => false,
    }
}

fn mark_node(node: SyntaxNode, keep: bool, change_set: &ChangeSet) -> Vec<LineMark> {
    if !keep {
        return vec![LineMark::skip(node.lines())];
    }

    let mut marks = vec![LineMark::keep(node.lines())];
    let kind = node.kind();
    if matches!(
        kind,
        SyntaxKind::FunctionDecl | SyntaxKind::ClassDecl | SyntaxKind::MethodDef
    ) {
        marks.extend(
            node.attached_annotations()
                .into_iter()
                .map(|annotation| LineMark::keep(annotation.lines())),
        );
    }

    if kind == SyntaxKind::ClassDecl {
        let class = node.name_or("");
        for member in node.body() {
            let keep_member = keep_class_member(member, &class, change_set);
            marks.extend(mark_node(member, keep_member, change_set));
        }
    }
    marks
}

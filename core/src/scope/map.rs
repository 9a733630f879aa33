use super::{ScopePath, GLOBAL};
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxTree};
use std::ops::RangeInclusive;

/// Total mapping from 1-indexed source line to its enclosing scope.
///
/// Lines never assigned during the walk (blank lines, top-level line
/// comments, lines past the end) resolve to `global`.
#[derive(Debug, Clone, Default)]
pub struct ScopeMap {
    /// Index 0 is line 1
    lines: Vec<Option<ScopePath>>,
}

impl ScopeMap {
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut map = Self {
            lines: vec![None; tree.line_count()],
        };
        let global = ScopePath::global();
        for node in tree.root_children() {
            map.visit(node, &global);
        }
        map
    }

    pub fn scope_of(&self, line: usize) -> &ScopePath {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .and_then(Option::as_ref)
            .unwrap_or(&GLOBAL)
    }

    /// Whether the walk assigned `line` explicitly.
    pub fn is_assigned(&self, line: usize) -> bool {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .is_some_and(Option::is_some)
    }

    fn visit(&mut self, node: SyntaxNode, scope: &ScopePath) {
        match node.kind() {
            SyntaxKind::FunctionDecl | SyntaxKind::MethodDef => {
                let inner = scope.function(node.name_or("<function>"));
                self.attach_annotations(node, &inner);
                self.assign(node.lines(), &inner);
                for child in node.body() {
                    self.visit(child, &inner);
                }
            }
            SyntaxKind::ClassDecl => {
                let inner = scope.class(node.name_or("<class>"));
                self.attach_annotations(node, scope);
                self.assign(node.lines(), scope);
                for child in node.body() {
                    self.visit(child, &inner);
                }
            }
            SyntaxKind::Comment if scope.is_global() && !node.is_doc_comment() => {}
            _ => self.assign(node.lines(), scope),
        }
    }

    fn attach_annotations(&mut self, node: SyntaxNode, scope: &ScopePath) {
        for annotation in node.attached_annotations() {
            self.assign(annotation.lines(), scope);
        }
    }

    fn assign(&mut self, lines: RangeInclusive<usize>, scope: &ScopePath) {
        let end = *lines.end();
        if self.lines.len() < end {
            self.lines.resize(end, None);
        }
        for line in lines {
            self.lines[line - 1] = Some(scope.clone());
        }
    }
}

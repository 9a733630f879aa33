//! Tree-sitter adapter.
//!
//! Wraps a parsed tree in a small, language-neutral view: every node reports a
//! closed [`SyntaxKind`], its row span, named children, an optional name and
//! its previous sibling. Everything above this module works on that view only.

pub mod language;

pub use language::SourceLanguage;

use crate::error::ParseFailure;
use std::ops::RangeInclusive;
use tree_sitter::{Node, Parser, Tree};

/// Structural role of a node, as far as scope mapping and slicing care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Import,
    VariableDecl,
    FunctionDecl,
    ClassDecl,
    MethodDef,
    FieldDecl,
    Comment,
    /// A statement consisting of a call, e.g. `describe("x", () => {})`
    CallExpression,
    Other,
}

/// A successfully parsed source file.
pub struct SyntaxTree<'s> {
    tree: Tree,
    source: &'s str,
    language: SourceLanguage,
}

impl<'s> SyntaxTree<'s> {
    /// Parse `source` with the grammar for `language`.
    ///
    /// Trees containing error or missing nodes are rejected so that callers
    /// never reason about half-recovered structure.
    pub fn parse(source: &'s str, language: SourceLanguage) -> Result<Self, ParseFailure> {
        let grammar = language.grammar()?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| ParseFailure::Grammar {
                message: e.to_string(),
            })?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseFailure::Grammar {
                message: "parser produced no tree".to_owned(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ParseFailure::Syntax {
                line: first_error_row(root) + 1,
            });
        }

        Ok(Self {
            tree,
            source,
            language,
        })
    }

    /// Parse `source`, picking the grammar from `file_path`'s extension.
    pub fn parse_path(source: &'s str, file_path: &str) -> Result<Self, ParseFailure> {
        let language =
            SourceLanguage::from_path(file_path).ok_or_else(|| ParseFailure::UnsupportedLanguage {
                path: file_path.to_owned(),
            })?;
        Self::parse(source, language)
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: self.tree.root_node(),
            source: self.source,
        }
    }

    /// Top-level statements, in source order.
    pub fn root_children(&self) -> Vec<SyntaxNode<'_>> {
        self.root().named_children()
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Number of source lines, counting a final line without a newline.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}

impl std::fmt::Debug for SyntaxTree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("lines", &self.line_count())
            .finish_non_exhaustive()
    }
}

/// Borrowed view of one node. Cheap to copy.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxNode<'a> {
    node: Node<'a>,
    source: &'a str,
}

impl<'a> SyntaxNode<'a> {
    fn wrap(&self, node: Node<'a>) -> Self {
        Self {
            node,
            source: self.source,
        }
    }

    /// The node that carries name and body. For `export function f() {}` this
    /// is the wrapped declaration; the span stays the export's.
    fn declaration(&self) -> Node<'a> {
        if self.node.kind() == "export_statement" {
            if let Some(decl) = self.node.child_by_field_name("declaration") {
                return decl;
            }
        }
        self.node
    }

    /// The call inside an expression statement (or the node itself if it is a call).
    fn call(&self) -> Option<Node<'a>> {
        match self.node.kind() {
            "call_expression" => Some(self.node),
            "expression_statement" => {
                let mut cursor = self.node.walk();
                let call = self
                    .node
                    .named_children(&mut cursor)
                    .find(|child| child.kind() == "call_expression");
                call
            }
            _ => None,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        if self.call().is_some() {
            return SyntaxKind::CallExpression;
        }
        classify(self.declaration().kind())
    }

    /// The grammar's own node type, for diagnostics.
    pub fn raw_kind(&self) -> &'static str {
        self.node.kind()
    }

    /// 0-indexed first row.
    pub fn start_row(&self) -> usize {
        self.node.start_position().row
    }

    /// 0-indexed last row, inclusive.
    pub fn end_row(&self) -> usize {
        self.node.end_position().row
    }

    /// 1-indexed, inclusive line span.
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.start_row() + 1..=self.end_row() + 1
    }

    pub fn named_children(&self) -> Vec<SyntaxNode<'a>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|child| self.wrap(child))
            .collect()
    }

    /// Statements of the node's body block, or empty if it has none.
    pub fn body(&self) -> Vec<SyntaxNode<'a>> {
        match self.declaration().child_by_field_name("body") {
            Some(body) => self.wrap(body).named_children(),
            None => Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        let decl = self.declaration();
        // JavaScript class fields name their key `property`
        decl.child_by_field_name("name")
            .or_else(|| decl.child_by_field_name("property"))
            .map(|n| node_text(n, self.source))
    }

    pub fn name_or(&self, fallback: &str) -> String {
        self.name().unwrap_or(fallback).to_owned()
    }

    /// Previous named sibling, if any.
    pub fn prev_sibling(&self) -> Option<SyntaxNode<'a>> {
        self.node.prev_named_sibling().map(|n| self.wrap(n))
    }

    pub fn text(&self) -> &'a str {
        node_text(self.node, self.source)
    }

    pub fn is_doc_comment(&self) -> bool {
        self.kind() == SyntaxKind::Comment && self.text().starts_with("/**")
    }

    /// Doc comments and free-standing decorators belong to the declaration
    /// right below them. Decorators the grammar nests inside a class, method
    /// or field are already part of that declaration's span, so a decorated
    /// declaration is never an annotation of its successor.
    pub fn is_annotation(&self) -> bool {
        self.is_doc_comment() || self.raw_kind() == "decorator"
    }

    /// Walk back over the annotations directly attached to this node: each one
    /// must be a free-standing decorator or doc comment ending on the row just above the
    /// node (or annotation) that follows it.
    pub fn attached_annotations(&self) -> Vec<SyntaxNode<'a>> {
        let mut attached = Vec::new();
        let mut current = *self;
        while let Some(prev) = current.prev_sibling() {
            if !prev.is_annotation() || prev.end_row() + 1 != current.start_row() {
                break;
            }
            attached.push(prev);
            current = prev;
        }
        attached
    }

    /// Callee identifier of a call statement. Member callees like `it.only`
    /// are not identifiers and yield `None`.
    pub fn callee(&self) -> Option<&'a str> {
        let function = self.call()?.child_by_field_name("function")?;
        (function.kind() == "identifier").then(|| node_text(function, self.source))
    }

    pub fn call_arguments(&self) -> Vec<SyntaxNode<'a>> {
        let Some(arguments) = self
            .call()
            .and_then(|call| call.child_by_field_name("arguments"))
        else {
            return Vec::new();
        };
        self.wrap(arguments).named_children()
    }

    /// First argument that reads like a description: a string, template
    /// string or string concatenation.
    pub fn description_literal(&self) -> Option<&'a str> {
        self.call_arguments()
            .into_iter()
            .find(|arg| {
                matches!(
                    arg.raw_kind(),
                    "string" | "template_string" | "binary_expression"
                )
            })
            .map(|arg| arg.text())
    }

    /// Statements inside the first function argument of a call, e.g. the
    /// callback of `describe("x", function () { ... })`.
    pub fn callback_body(&self) -> Vec<SyntaxNode<'a>> {
        let callback = self.call_arguments().into_iter().find(|arg| {
            matches!(
                arg.raw_kind(),
                "function_expression" | "function" | "arrow_function"
            )
        });
        match callback.and_then(|cb| cb.node.child_by_field_name("body")) {
            Some(body) if body.kind() == "statement_block" => self.wrap(body).named_children(),
            _ => Vec::new(),
        }
    }
}

fn classify(kind: &str) -> SyntaxKind {
    match kind {
        "import_statement" => SyntaxKind::Import,
        "lexical_declaration" | "variable_declaration" => SyntaxKind::VariableDecl,
        "function_declaration" | "generator_function_declaration" => SyntaxKind::FunctionDecl,
        "class_declaration" | "abstract_class_declaration" => SyntaxKind::ClassDecl,
        "method_definition" | "method_signature" | "abstract_method_signature" => {
            SyntaxKind::MethodDef
        }
        "field_definition" | "public_field_definition" => SyntaxKind::FieldDecl,
        "comment" => SyntaxKind::Comment,
        _ => SyntaxKind::Other,
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Row of the first error or missing node, depth first.
fn first_error_row(node: Node) -> usize {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_error() || child.is_missing() {
            return child.start_position().row;
        }
        if child.has_error() {
            return first_error_row(child);
        }
    }
    node.start_position().row
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"import x from "y";
const a = 1;

/** Adds things. */
function add(p, q) {
  return p + q;
}

export class Box {
  size = 3;

  constructor() {}

  open() {
    return true;
  }
}

describe("Box", () => {
  it("opens", () => {});
});
"#;

    fn parse(source: &str) -> SyntaxTree<'_> {
        SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap()
    }

    #[test]
    fn test_top_level_kinds() {
        let tree = parse(SOURCE);
        let kinds: Vec<SyntaxKind> = tree.root_children().iter().map(SyntaxNode::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Import,
                SyntaxKind::VariableDecl,
                SyntaxKind::Comment,
                SyntaxKind::FunctionDecl,
                SyntaxKind::ClassDecl,
                SyntaxKind::CallExpression,
            ]
        );
    }

    #[test]
    fn test_names_and_spans() {
        let tree = parse(SOURCE);
        let children = tree.root_children();
        let add = children[3];
        assert_eq!(add.name(), Some("add"));
        assert_eq!(add.lines(), 5..=7);

        let class = children[4];
        assert_eq!(class.name(), Some("Box"));
        // Export keeps its own span
        assert_eq!(class.start_row(), 8);
        assert_eq!(class.raw_kind(), "export_statement");
    }

    #[test]
    fn test_class_body_members() {
        let tree = parse(SOURCE);
        let class = tree.root_children()[4];
        let members: Vec<(SyntaxKind, String)> = class
            .body()
            .iter()
            .map(|m| (m.kind(), m.name_or("?")))
            .collect();
        assert_eq!(
            members,
            vec![
                (SyntaxKind::FieldDecl, "size".to_owned()),
                (SyntaxKind::MethodDef, "constructor".to_owned()),
                (SyntaxKind::MethodDef, "open".to_owned()),
            ]
        );
    }

    #[test]
    fn test_doc_comment_attachment() {
        let tree = parse(SOURCE);
        let add = tree.root_children()[3];
        let attached = add.attached_annotations();
        assert_eq!(attached.len(), 1);
        assert!(attached[0].is_doc_comment());

        // `const a` is not an annotation
        let comment = tree.root_children()[2];
        assert!(comment.attached_annotations().is_empty());
    }

    #[test]
    fn test_annotation_must_be_adjacent() {
        let source = "/** Detached. */\n\nfunction f() {}\n";
        let tree = parse(source);
        let f = tree.root_children()[1];
        assert!(f.attached_annotations().is_empty());
    }

    #[test]
    fn test_decorated_declaration_is_not_an_annotation() {
        let source = "@Component()\nclass A {}\n@Dec()\nclass B {}\n";
        let tree = parse(source);
        let roots = tree.root_children();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[1].start_row(), 2);
        assert!(roots[1].text().starts_with('@'));
        assert!(!roots[0].is_annotation());
        assert!(roots[1].attached_annotations().is_empty());
    }

    #[test]
    fn test_call_helpers() {
        let tree = parse(SOURCE);
        let suite = tree.root_children()[5];
        assert_eq!(suite.callee(), Some("describe"));
        assert_eq!(suite.description_literal(), Some("\"Box\""));

        let body = suite.callback_body();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].callee(), Some("it"));
        assert_eq!(body[0].description_literal(), Some("\"opens\""));
    }

    #[test]
    fn test_member_callee_is_not_identifier() {
        let tree = parse("it.only(\"x\", () => {});\n");
        let call = tree.root_children()[0];
        assert_eq!(call.kind(), SyntaxKind::CallExpression);
        assert_eq!(call.callee(), None);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let result = SyntaxTree::parse("const a = 1;\nfunction (\n", SourceLanguage::JavaScript);
        assert!(matches!(result, Err(ParseFailure::Syntax { .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SyntaxTree::parse_path("body { color: red; }", "site/main.css");
        assert_eq!(
            result.unwrap_err(),
            ParseFailure::UnsupportedLanguage {
                path: "site/main.css".to_owned()
            }
        );
    }
}

use super::{LineMark, Mark, SliceResult};
use crate::syntax::{SyntaxKind, SyntaxTree};

/// Keep the file's preamble and only its first `limit` top-level functions or
/// classes.
///
/// Imports, variable declarations and comments always survive; decorators
/// of a kept definition survive with it. Everything else,
/// including blank lines, is dropped. Useful for showing the shape of an
/// existing test file without its full body.
pub fn slice_leading_definitions(tree: &SyntaxTree, limit: usize) -> SliceResult {
    let mut marks = Vec::new();
    let mut definitions = 0;

    for node in tree.root_children() {
        match node.kind() {
            SyntaxKind::Import | SyntaxKind::VariableDecl | SyntaxKind::Comment => {
                marks.push(LineMark::keep(node.lines()));
            }
            SyntaxKind::FunctionDecl | SyntaxKind::ClassDecl if definitions < limit => {
                definitions += 1;
                marks.push(LineMark::keep(node.lines()));
                marks.extend(
                    node.attached_annotations()
                        .iter()
                        .map(|annotation| LineMark::keep(annotation.lines())),
                );
            }
            _ => {}
        }
    }

    SliceResult::from_marks(tree.source(), &marks, Mark::Skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::Annotation;
    use crate::syntax::SourceLanguage;
    use std::collections::BTreeSet;

    #[test]
    fn test_keeps_first_definitions() {
        let source = r#"import assert from "assert";
// helpers
function one() {}

function two() {}
const shared = 1;
class Three {}
function four() {}
describe("suite", () => {});
"#;
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        let text = slice_leading_definitions(&tree, 2).render(Annotation::Plain, &BTreeSet::new());
        assert_eq!(
            text,
            "import assert from \"assert\";\n// helpers\nfunction one() {}\nfunction two() {}\nconst shared = 1;"
        );
    }

    #[test]
    fn test_zero_limit_keeps_preamble_only() {
        let source = "const a = 1;\nfunction f() {}\n";
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        assert_eq!(slice_leading_definitions(&tree, 0).line_numbers(), vec![1]);
    }
}

//! Test-case change detection over nested suite/case call trees.
//!
//! A test file is read as a tree of calls such as
//! `describe("X", () => { it("y", () => { ... }) })`. Suite calls extend a
//! space-joined suite path; case calls are recorded under
//! `"<suite path> <description>"`. Comparing two revisions reports the cases
//! that are new or whose text changed.

use crate::diff::render::lines_differ;
use crate::error::ParseFailure;
use crate::syntax::{SourceLanguage, SyntaxKind, SyntaxNode, SyntaxTree};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const GLOBAL_SUITE: &str = "global";

/// Callee identifiers that open a suite or declare a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestSyntax {
    pub suite_callees: Vec<String>,
    pub case_callees: Vec<String>,
}

impl Default for TestSyntax {
    fn default() -> Self {
        Self {
            suite_callees: vec!["describe".to_owned()],
            case_callees: vec!["it".to_owned()],
        }
    }
}

impl TestSyntax {
    fn is_suite(&self, callee: &str) -> bool {
        self.suite_callees.iter().any(|c| c == callee)
    }

    fn is_case(&self, callee: &str) -> bool {
        self.case_callees.iter().any(|c| c == callee)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub qualified_name: String,
    /// Space-joined suite path, `global` at the top level
    pub scope: String,
    pub description: String,
    /// Full text of the case statement
    pub body_text: String,
}

/// Cases of one file keyed by qualified name, in source order.
///
/// A later case with the same qualified name replaces the earlier one but
/// keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCaseMap {
    cases: Vec<TestCase>,
}

impl TestCaseMap {
    pub fn get(&self, qualified_name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.qualified_name == qualified_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.qualified_name.as_str()).collect()
    }

    fn insert(&mut self, case: TestCase) {
        match self
            .cases
            .iter_mut()
            .find(|c| c.qualified_name == case.qualified_name)
        {
            Some(existing) => *existing = case,
            None => self.cases.push(case),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseChange {
    New,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedCase {
    pub qualified_name: String,
    pub change: CaseChange,
}

/// Walk the suite/case call tree of `tree`.
pub fn collect_test_cases(tree: &SyntaxTree, syntax: &TestSyntax) -> TestCaseMap {
    let mut map = TestCaseMap::default();
    for node in tree.root_children() {
        visit(node, GLOBAL_SUITE, syntax, &mut map);
    }
    map
}

fn visit(node: SyntaxNode, suite: &str, syntax: &TestSyntax, map: &mut TestCaseMap) {
    if node.kind() != SyntaxKind::CallExpression {
        return;
    }
    let Some(callee) = node.callee() else {
        return;
    };

    if syntax.is_case(callee) {
        let description = describe(node, "<it>");
        let qualified_name = qualify(suite, &description);
        map.insert(TestCase {
            qualified_name,
            scope: suite.to_owned(),
            description,
            body_text: node.text().to_owned(),
        });
    } else if syntax.is_suite(callee) {
        let description = describe(node, "<describe>");
        let nested = qualify(suite, &description);
        for child in node.callback_body() {
            visit(child, &nested, syntax, map);
        }
    }
}

fn qualify(suite: &str, description: &str) -> String {
    if suite == GLOBAL_SUITE {
        description.to_owned()
    } else {
        format!("{suite} {description}")
    }
}

fn describe(node: SyntaxNode, fallback: &str) -> String {
    clean_description(node.description_literal().unwrap_or(fallback))
}

/// Strip quotes and concatenation operators and collapse whitespace, so a
/// description split across lines or concatenated compares equal to its
/// one-line form.
pub fn clean_description(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '+'))
        .map(|c| if matches!(c, '\n' | '\t' | '\r') { ' ' } else { c })
        .collect();
    WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
}

/// Cases of `new` that are absent from `old` or whose text differs.
/// Removed cases are not reported.
pub fn changed_cases(old: &TestCaseMap, new: &TestCaseMap) -> Vec<ChangedCase> {
    new.iter()
        .filter_map(|case| {
            let change = match old.get(&case.qualified_name) {
                None => CaseChange::New,
                Some(previous) if lines_differ(&previous.body_text, &case.body_text) => {
                    CaseChange::Modified
                }
                Some(_) => return None,
            };
            debug!("[tests] {:?}: {}", change, case.qualified_name);
            Some(ChangedCase {
                qualified_name: case.qualified_name.clone(),
                change,
            })
        })
        .collect()
}

/// Parse both revisions and report changed cases.
///
/// An unparseable pre-image contributes no cases (everything is new); an
/// unparseable post-image is an error.
pub fn detect_changes(
    before: &str,
    after: &str,
    language: SourceLanguage,
    syntax: &TestSyntax,
) -> Result<Vec<ChangedCase>, ParseFailure> {
    let new_tree = SyntaxTree::parse(after, language)?;
    let new_cases = collect_test_cases(&new_tree, syntax);

    let old_cases = match SyntaxTree::parse(before, language) {
        Ok(tree) => collect_test_cases(&tree, syntax),
        Err(failure) => {
            debug!("[tests] pre-image unparseable, treating all cases as new: {failure}");
            TestCaseMap::default()
        }
    };

    Ok(changed_cases(&old_cases, &new_cases))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cases(source: &str) -> TestCaseMap {
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        collect_test_cases(&tree, &TestSyntax::default())
    }

    #[test]
    fn test_nested_suites_qualify_names() {
        let map = cases(
            r#"describe("X", () => {
  describe('inner', function () {
    it("y", () => {
      expect(1).toBe(1);
    });
  });
  it(`z`, () => {});
});
it("top", () => {});
"#,
        );
        assert_eq!(map.names(), vec!["X inner y", "X z", "top"]);

        let y = map.get("X inner y").unwrap();
        assert_eq!(y.scope, "X inner");
        assert_eq!(y.description, "y");
        assert!(y.body_text.starts_with("it(\"y\""));

        assert_eq!(map.get("top").unwrap().scope, "global");
    }

    #[test]
    fn test_description_cleaning() {
        assert_eq!(clean_description("\"adds \" +\n    \"numbers\""), "adds numbers");
        assert_eq!(clean_description("'it\tworks'"), "it works");
        assert_eq!(clean_description("`tmpl`"), "tmpl");
    }

    #[test]
    fn test_concatenated_description() {
        let map = cases("it(\"handles \" +\n  \"long names\", () => {});\n");
        assert_eq!(map.names(), vec!["handles long names"]);
    }

    #[test]
    fn test_missing_description_falls_back() {
        let map = cases("describe(() => {\n  it(name, () => {});\n});\n");
        assert_eq!(map.names(), vec!["<describe> <it>"]);
    }

    #[test]
    fn test_other_calls_are_ignored() {
        let map = cases("beforeEach(() => {});\nit.skip(\"x\", () => {});\nfoo();\n");
        assert!(map.is_empty());
    }

    #[test]
    fn test_custom_syntax() {
        let tree = SyntaxTree::parse(
            "suite(\"S\", () => {\n  test(\"t\", () => {});\n});\n",
            SourceLanguage::JavaScript,
        )
        .unwrap();
        let syntax = TestSyntax {
            suite_callees: vec!["suite".to_owned()],
            case_callees: vec!["test".to_owned()],
        };
        assert_eq!(collect_test_cases(&tree, &syntax).names(), vec!["S t"]);
    }

    #[test]
    fn test_changed_case_detection() {
        let before = r#"describe("X", () => {
  it("y", () => {
    expect(a).toBe(1);
  });
  it("same", () => {});
  it("removed", () => {});
});
"#;
        let after = r#"describe("X", () => {
  it("y", () => {
    expect(a).toBe(2);
  });
  it("same", () => {});
  it("added", () => {});
});
"#;
        let changes = detect_changes(
            before,
            after,
            SourceLanguage::JavaScript,
            &TestSyntax::default(),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![
                ChangedCase {
                    qualified_name: "X y".to_owned(),
                    change: CaseChange::Modified,
                },
                ChangedCase {
                    qualified_name: "X added".to_owned(),
                    change: CaseChange::New,
                },
            ]
        );
    }

    #[test]
    fn test_same_description_in_different_suites() {
        let before = "describe(\"A\", () => {\n  it(\"x\", () => { a(); });\n});\ndescribe(\"B\", () => {\n  it(\"x\", () => { b(); });\n});\n";
        let after = "describe(\"A\", () => {\n  it(\"x\", () => { a(); });\n});\ndescribe(\"B\", () => {\n  it(\"x\", () => { c(); });\n});\n";
        let changes = detect_changes(
            before,
            after,
            SourceLanguage::JavaScript,
            &TestSyntax::default(),
        )
        .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].qualified_name, "B x");
    }

    #[test]
    fn test_unparseable_before_makes_everything_new() {
        let changes = detect_changes(
            "describe(\"X\", () => {",
            "it(\"a\", () => {});\n",
            SourceLanguage::JavaScript,
            &TestSyntax::default(),
        )
        .unwrap();
        assert_eq!(changes[0].change, CaseChange::New);
    }

    #[test]
    fn test_unparseable_after_is_error() {
        let result = detect_changes(
            "it(\"a\", () => {});\n",
            "it(\"a\", () => {",
            SourceLanguage::JavaScript,
            &TestSyntax::default(),
        );
        assert!(matches!(result, Err(ParseFailure::Syntax { .. })));
    }
}

use super::{ScopeMap, ScopePath, ScopeSegment};
use crate::diff::{LineEdit, ParsedDiff};
use crate::syntax::SyntaxTree;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Declarations touched by a change.
///
/// Members are dot-joined function chains below their owner, e.g. `a` for a
/// method or `a.helper` for a function nested inside it. A class registered
/// with no members was touched outside any method (a field, the class body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub global_functions: BTreeSet<String>,
    pub class_methods: BTreeMap<String, BTreeSet<String>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.global_functions.is_empty() && self.class_methods.is_empty()
    }

    /// Reduce a scope path to its owner and member and record it.
    pub fn record(&mut self, scope: &ScopePath) {
        let segments = scope.segments();
        let innermost_class = segments
            .iter()
            .rposition(|s| matches!(s, ScopeSegment::Class(_)));

        match innermost_class {
            Some(idx) => {
                let ScopeSegment::Class(owner) = &segments[idx] else {
                    return;
                };
                let methods = self.class_methods.entry(owner.clone()).or_default();
                if let Some(member) = function_chain(&segments[idx + 1..]) {
                    methods.insert(member);
                }
            }
            None => {
                if let Some(member) = function_chain(segments) {
                    self.global_functions.insert(member);
                }
            }
        }
    }

    /// Merge another change-set into this one.
    pub fn extend(&mut self, other: ChangeSet) {
        self.global_functions.extend(other.global_functions);
        for (class, methods) in other.class_methods {
            self.class_methods.entry(class).or_default().extend(methods);
        }
    }

    #[must_use]
    pub fn union(mut self, other: ChangeSet) -> ChangeSet {
        self.extend(other);
        self
    }

    /// Whether a top-level function named `name` was touched.
    /// Whether top-level function `name` was touched, directly or through a
    /// function nested inside it. Nested names alone never match.
    pub fn keeps_function(&self, name: &str) -> bool {
        self.global_functions
            .iter()
            .any(|member| member.split('.').next() == Some(name))
    }

    pub fn keeps_class(&self, name: &str) -> bool {
        self.class_methods.contains_key(name)
    }

    /// Whether method `name` of class `class` was touched.
    pub fn keeps_method(&self, class: &str, name: &str) -> bool {
        self.class_methods
            .get(class)
            .is_some_and(|methods| methods.iter().any(|member| member_matches(member, name)))
    }
}

/// A method name matches a member if it is any of its dotted segments.
fn member_matches(member: &str, name: &str) -> bool {
    member.split('.').any(|segment| segment == name)
}

fn function_chain(segments: &[ScopeSegment]) -> Option<String> {
    let names: Vec<&str> = segments
        .iter()
        .filter_map(|s| match s {
            ScopeSegment::Function(name) => Some(name.as_str()),
            ScopeSegment::Class(_) => None,
        })
        .collect();
    (!names.is_empty()).then(|| names.join("."))
}

/// Map each edit's line through `map` and collect the touched declarations.
pub fn locate<'e>(edits: impl IntoIterator<Item = &'e LineEdit>, map: &ScopeMap) -> ChangeSet {
    let mut change_set = ChangeSet::default();
    for edit in edits {
        let scope = map.scope_of(edit.line_number);
        debug!("[locate] line {} -> {scope}", edit.line_number);
        change_set.record(scope);
    }
    change_set
}

/// Union of removed lines located in the pre-image and added lines located in
/// the post-image. A missing tree contributes nothing for its side.
pub fn locate_edits(
    before: Option<&SyntaxTree>,
    after: Option<&SyntaxTree>,
    parsed: &ParsedDiff,
) -> ChangeSet {
    let mut change_set = ChangeSet::default();
    if let Some(tree) = before {
        change_set.extend(locate(&parsed.removed, &ScopeMap::build(tree)));
    }
    if let Some(tree) = after {
        change_set.extend(locate(&parsed.added, &ScopeMap::build(tree)));
    }
    change_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{parse_hunks, EditKind};
    use crate::syntax::SourceLanguage;

    fn added(line_number: usize) -> LineEdit {
        LineEdit {
            line_number,
            text: String::new(),
            kind: EditKind::Added,
        }
    }

    #[test]
    fn test_record_reductions() {
        let mut set = ChangeSet::default();
        set.record(&ScopePath::global());
        assert!(set.is_empty());

        set.record(&ScopePath::global().function("foo"));
        set.record(&ScopePath::global().function("foo").function("helper"));
        set.record(&ScopePath::global().class("Bar").function("a"));
        set.record(&ScopePath::global().class("Baz"));
        set.record(
            &ScopePath::global()
                .function("f")
                .class("Inner")
                .function("m"),
        );

        assert_eq!(
            set.global_functions,
            BTreeSet::from(["foo".to_owned(), "foo.helper".to_owned()])
        );
        assert_eq!(set.class_methods["Bar"], BTreeSet::from(["a".to_owned()]));
        assert!(set.class_methods["Baz"].is_empty());
        assert_eq!(set.class_methods["Inner"], BTreeSet::from(["m".to_owned()]));
    }

    #[test]
    fn test_member_matching() {
        let mut set = ChangeSet::default();
        set.record(&ScopePath::global().function("outer").function("inner"));
        set.record(&ScopePath::global().class("Bar").function("a").function("cb"));

        assert!(set.keeps_function("outer"));
        assert!(!set.keeps_function("inner"));
        assert!(!set.keeps_function("out"));
        assert!(set.keeps_class("Bar"));
        assert!(set.keeps_method("Bar", "a"));
        assert!(!set.keeps_method("Bar", "b"));
        assert!(!set.keeps_method("Qux", "a"));
    }

    #[test]
    fn test_nested_function_does_not_keep_top_level_namesake() {
        let mut set = ChangeSet::default();
        set.record(&ScopePath::global().function("foo").function("helper"));
        assert!(set.keeps_function("foo"));
        assert!(!set.keeps_function("helper"));

        let mut set = ChangeSet::default();
        set.record(&ScopePath::global().class("Bar").function("a").function("cb"));
        assert!(set.keeps_method("Bar", "cb"));
    }

    #[test]
    fn test_union() {
        let mut left = ChangeSet::default();
        left.record(&ScopePath::global().class("A").function("x"));
        let mut right = ChangeSet::default();
        right.record(&ScopePath::global().class("A").function("y"));
        right.record(&ScopePath::global().function("g"));

        let merged = left.union(right);
        assert_eq!(merged.class_methods["A"].len(), 2);
        assert!(merged.keeps_function("g"));
    }

    #[test]
    fn test_locate_through_scope_map() {
        let source = "function foo() {\n  a();\n}\n\nclass Bar {\n  m() {\n    b();\n  }\n}\n";
        let tree = SyntaxTree::parse(source, SourceLanguage::JavaScript).unwrap();
        let map = ScopeMap::build(&tree);

        let edits = vec![added(2), added(4), added(7)];
        let set = locate(&edits, &map);
        assert_eq!(set.global_functions, BTreeSet::from(["foo".to_owned()]));
        assert_eq!(set.class_methods["Bar"], BTreeSet::from(["m".to_owned()]));
    }

    #[test]
    fn test_locate_edits_uses_both_revisions() {
        let before = "function gone() {\n  x();\n}\n";
        let after = "function fresh() {\n  y();\n}\n";
        let diff = "\
@@ -1,3 +1,3 @@
-function gone() {
-  x();
+function fresh() {
+  y();
 }
";
        let before_tree = SyntaxTree::parse(before, SourceLanguage::JavaScript).unwrap();
        let after_tree = SyntaxTree::parse(after, SourceLanguage::JavaScript).unwrap();
        let parsed = parse_hunks(diff);

        let both = locate_edits(Some(&before_tree), Some(&after_tree), &parsed);
        assert_eq!(
            both.global_functions,
            BTreeSet::from(["fresh".to_owned(), "gone".to_owned()])
        );

        let only_after = locate_edits(None, Some(&after_tree), &parsed);
        assert_eq!(
            only_after.global_functions,
            BTreeSet::from(["fresh".to_owned()])
        );
    }

    #[test]
    fn test_change_set_json_shape() {
        let mut set = ChangeSet::default();
        set.record(&ScopePath::global().class("Bar").function("a"));
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["classMethods"]["Bar"][0], "a");
        assert!(json["globalFunctions"].as_array().unwrap().is_empty());
    }
}

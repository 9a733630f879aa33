//! Line-indexed scope paths.
//!
//! A [`ScopePath`] is the chain of functions and classes enclosing a line.
//! It is kept as segments internally and rendered to the dotted/colon string
//! form only at the API boundary:
//!
//! | segments                                   | rendered             |
//! |--------------------------------------------|----------------------|
//! | (none)                                     | `global`             |
//! | `Function(f)`                              | `global.f`           |
//! | `Class(A)`, `Function(m)`                  | `A.m`                |
//! | `Function(f)`, `Class(Inner)`, `Function(m)` | `global.f:Inner.m` |

pub mod locate;
pub mod map;

pub use locate::{locate, locate_edits, ChangeSet};
pub use map::ScopeMap;

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeSegment {
    Function(String),
    Class(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopePath(Vec<ScopeSegment>);

/// The top-level scope.
pub(crate) static GLOBAL: ScopePath = ScopePath(Vec::new());

impl ScopePath {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[ScopeSegment] {
        &self.0
    }

    /// This scope extended by a function (or method) named `name`.
    pub fn function(&self, name: impl Into<String>) -> Self {
        self.child(ScopeSegment::Function(name.into()))
    }

    /// This scope extended by a class named `name`.
    pub fn class(&self, name: impl Into<String>) -> Self {
        self.child(ScopeSegment::Class(name.into()))
    }

    fn child(&self, segment: ScopeSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::from("global");
        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                ScopeSegment::Function(name) => {
                    rendered.push('.');
                    rendered.push_str(name);
                }
                // A root class replaces "global"; nested classes hang off a colon
                ScopeSegment::Class(name) if idx == 0 => rendered.clone_from(name),
                ScopeSegment::Class(name) => {
                    rendered.push(':');
                    rendered.push_str(name);
                }
            }
        }
        f.write_str(&rendered)
    }
}

impl Serialize for ScopePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_global() {
        assert_eq!(ScopePath::global().to_string(), "global");
        assert!(GLOBAL.is_global());
    }

    #[test]
    fn test_render_function_and_method() {
        assert_eq!(ScopePath::global().function("funcA").to_string(), "global.funcA");
        assert_eq!(
            ScopePath::global().class("ClassA").function("methodB").to_string(),
            "ClassA.methodB"
        );
        assert_eq!(
            ScopePath::global()
                .function("outer")
                .function("inner")
                .to_string(),
            "global.outer.inner"
        );
    }

    #[test]
    fn test_render_nested_class() {
        let path = ScopePath::global()
            .function("f")
            .class("Inner")
            .function("m");
        assert_eq!(path.to_string(), "global.f:Inner.m");
        assert_eq!(ScopePath::global().class("A").class("B").to_string(), "A:B");
    }

    #[test]
    fn test_serializes_as_string() {
        let path = ScopePath::global().class("Bar").function("a");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"Bar.a\"");
    }
}

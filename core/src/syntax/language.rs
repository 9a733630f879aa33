//! Grammar selection by file extension.

use crate::error::ParseFailure;
use serde::{Deserialize, Serialize};
use tree_sitter::Language;

/// Source languages the scope tools understand.
///
/// TypeScript variants are always nameable so options can be deserialized
/// regardless of build features; loading their grammar fails with
/// [`ParseFailure::UnsupportedLanguage`] unless `lang-typescript` is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    #[default]
    JavaScript,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Pick a language from a file path's extension.
    pub fn from_path(file_path: &str) -> Option<Self> {
        let file_name = file_path.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Load the tree-sitter grammar for this language.
    pub fn grammar(self) -> Result<Language, ParseFailure> {
        match self {
            Self::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            #[cfg(feature = "lang-typescript")]
            Self::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            #[cfg(feature = "lang-typescript")]
            Self::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            #[cfg(not(feature = "lang-typescript"))]
            Self::TypeScript | Self::Tsx => Err(ParseFailure::UnsupportedLanguage {
                path: format!("<{}>", self.name()),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
        }
    }
}

use serde::Serialize;
use thiserror::Error;

/// Unified error type for patchscope.
///
/// Every lower-level failure converts into this enum so callers (and the
/// CLI's JSON output) see one serializable shape.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum Error {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Patch error: {message}")]
    Patch { message: String },

    #[error("Injection error: {message}")]
    Inject { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a Patch error
    pub fn patch(message: impl Into<String>) -> Self {
        Self::Patch {
            message: message.into(),
        }
    }

    /// Create an Injection error
    pub fn inject(message: impl Into<String>) -> Self {
        Self::Inject {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (the caller can fall back or retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Slicing degrades to the unsliced file
            // A post-image can be supplied explicitly instead
            // Files may reappear
            Self::Parse { .. } | Self::Patch { .. } | Self::Io { .. } => true,
            // No safe default insertion point exists
            // Bad options won't change on retry
            Self::Inject { .. } | Self::Config { .. } => false,
        }
    }
}

/// Why a source text could not be turned into a syntax tree.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum ParseFailure {
    #[error("no grammar available for {path}")]
    UnsupportedLanguage { path: String },

    #[error("grammar could not be loaded: {message}")]
    Grammar { message: String },

    #[error("source has syntax errors starting at line {line}")]
    Syntax { line: usize },
}

/// A line starting with `@@` that is not a well-formed hunk header.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("malformed hunk header at diff line {diff_line}: {header}")]
#[serde(rename_all = "camelCase")]
pub struct MalformedHunk {
    /// 1-indexed line of the header within the diff text
    pub diff_line: usize,
    pub header: String,
}

/// Failure to reconstruct a post-image from a pre-image and its hunks.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum PatchError {
    #[error("hunk expects {expected:?} at line {line}, found {found:?}")]
    ContextMismatch {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("hunk touches line {line} but the file has {len} lines")]
    OutOfRange { line: usize, len: usize },

    #[error("hunk starting at line {line} overlaps the previous hunk")]
    Overlap { line: usize },
}

/// Failure to find a place for an injected fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    #[error("cannot inject into unparseable file: {0}")]
    Parse(#[from] ParseFailure),

    #[error("file has no top-level statement to anchor the fragment")]
    NoInsertionPoint,

    #[error("suite {suite:?} has no statements to anchor the fragment")]
    EmptySuite { suite: String },

    #[error("no top-level suite named {suite:?}")]
    SuiteNotFound { suite: String },
}

impl From<ParseFailure> for Error {
    fn from(err: ParseFailure) -> Self {
        Error::parse(err.to_string())
    }
}

impl From<MalformedHunk> for Error {
    fn from(err: MalformedHunk) -> Self {
        Error::patch(err.to_string())
    }
}

impl From<PatchError> for Error {
    fn from(err: PatchError) -> Self {
        Error::patch(err.to_string())
    }
}

impl From<InjectError> for Error {
    fn from(err: InjectError) -> Self {
        match err {
            InjectError::Parse(failure) => failure.into(),
            other => Error::inject(other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::config(err.to_string())
    }
}

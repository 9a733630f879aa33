pub mod apply;
pub mod parser;
pub mod render;

pub use apply::apply_hunks;
pub use parser::{
    edited_files, parse_hunks, split_by_file, EditKind, FileDiff, HunkHeader, LineEdit, ParsedDiff,
};
pub use render::unified_diff;

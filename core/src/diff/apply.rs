//! Reconstruct a post-image from a pre-image and a single-file diff.
//!
//! Application is strict: every hunk must land exactly at its header's
//! position and every context and removed line must match. No fuzz.

use super::parser::{parse_hunk_header, HunkHeader};
use crate::error::PatchError;

#[derive(Debug)]
enum BodyLine<'d> {
    Context(&'d str),
    Removed(&'d str),
    Added(&'d str),
    /// `\ No newline at end of file`
    NoNewline,
}

#[derive(Debug)]
struct Hunk<'d> {
    header: HunkHeader,
    body: Vec<BodyLine<'d>>,
}

/// Apply the hunks of `diff` to `before`.
pub fn apply_hunks(before: &str, diff: &str) -> Result<String, PatchError> {
    let old_lines: Vec<&str> = before.lines().collect();
    let mut new_lines: Vec<&str> = Vec::with_capacity(old_lines.len());
    let mut pos = 0usize;
    let mut touched_eof = false;
    let mut new_missing_newline = false;

    for hunk in read_hunks(diff) {
        let header = hunk.header;
        // A zero-length old range names the line *after which* to insert
        let start = if header.old_count == 0 {
            header.old_start
        } else {
            header.old_start.saturating_sub(1)
        };
        if start < pos {
            return Err(PatchError::Overlap {
                line: header.old_start,
            });
        }
        if start > old_lines.len() {
            return Err(PatchError::OutOfRange {
                line: header.old_start,
                len: old_lines.len(),
            });
        }

        new_lines.extend_from_slice(&old_lines[pos..start]);
        pos = start;

        let mut last_side_is_new = false;
        for line in &hunk.body {
            match *line {
                BodyLine::Context(text) => {
                    expect_line(&old_lines, pos, text)?;
                    new_lines.push(old_lines[pos]);
                    pos += 1;
                    last_side_is_new = true;
                }
                BodyLine::Removed(text) => {
                    expect_line(&old_lines, pos, text)?;
                    pos += 1;
                    last_side_is_new = false;
                }
                BodyLine::Added(text) => {
                    new_lines.push(text);
                    last_side_is_new = true;
                }
                BodyLine::NoNewline => {
                    if last_side_is_new {
                        new_missing_newline = true;
                    }
                }
            }
        }
        touched_eof = pos == old_lines.len();
    }

    new_lines.extend_from_slice(&old_lines[pos..]);

    let trailing_newline = !new_missing_newline
        && !new_lines.is_empty()
        && (before.ends_with('\n') || before.is_empty() || touched_eof);

    let mut after = new_lines.join("\n");
    if trailing_newline {
        after.push('\n');
    }
    Ok(after)
}

fn expect_line(old_lines: &[&str], pos: usize, expected: &str) -> Result<(), PatchError> {
    let Some(found) = old_lines.get(pos) else {
        return Err(PatchError::OutOfRange {
            line: pos + 1,
            len: old_lines.len(),
        });
    };
    if found.trim_end_matches('\r') != expected.trim_end_matches('\r') {
        return Err(PatchError::ContextMismatch {
            line: pos + 1,
            expected: expected.to_owned(),
            found: (*found).to_owned(),
        });
    }
    Ok(())
}

/// Collect well-formed hunks with their bodies; lines under a malformed
/// header are dropped along with it.
fn read_hunks(diff: &str) -> Vec<Hunk<'_>> {
    let mut hunks: Vec<Hunk<'_>> = Vec::new();
    let mut in_hunk = false;

    for line in diff.lines() {
        if line.starts_with("@@") {
            match parse_hunk_header(line) {
                Some(header) => {
                    hunks.push(Hunk {
                        header,
                        body: Vec::new(),
                    });
                    in_hunk = true;
                }
                None => in_hunk = false,
            }
            continue;
        }
        if line.starts_with("diff --git ") {
            in_hunk = false;
            continue;
        }
        if !in_hunk {
            continue;
        }
        let Some(hunk) = hunks.last_mut() else {
            continue;
        };

        let body_line = match line.as_bytes().first() {
            Some(b'+') if !line.starts_with("+++") => BodyLine::Added(&line[1..]),
            Some(b'-') if !line.starts_with("---") => BodyLine::Removed(&line[1..]),
            Some(b'\\') => BodyLine::NoNewline,
            Some(b' ') => BodyLine::Context(&line[1..]),
            // Some tools strip the single space from empty context lines
            None => BodyLine::Context(""),
            _ => continue,
        };
        hunk.body.push(body_line);
    }

    hunks
}

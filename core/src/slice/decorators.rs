//! Post-passes over rendered slices.

use super::Annotation;
use regex::Regex;
use std::sync::LazyLock;

/// Optional edit marker, optional line number, then `@`.
static DECORATOR_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\s*\d*\s*@").unwrap());

/// Optional edit marker and line number, then a function, class or method head.
static DECLARATION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\+?\s*\d*\s*(?:(?:export\s+)?(?:default\s+)?(?:async\s+)?function\b|(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\b|(?:(?:static|async|get|set|public|private|protected|readonly|override)\s+)*[*#]?[A-Za-z_$][A-Za-z0-9_:$]*\s*\()",
    )
    .unwrap()
});

/// Optional edit marker and line number, then a class field.
static FIELD_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\+?\s*\d*\s*(?:(?:static|readonly|public|private|protected|declare|accessor)\s+)*#?[A-Za-z_$][A-Za-z0-9_$]*\s*(?:[=;:]|$)",
    )
    .unwrap()
});

/// Decorators followed by a member on the same line, as in `@observable x = 1;`.
static INLINE_DECORATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?\s*\d*\s*(?:@[A-Za-z_$][\w.$]*(?:\([^()]*\))?\s+)+[#*A-Za-z_$]").unwrap()
});

static NUMBERED_BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^\d+ \n)(\d+ \n)+").unwrap());

static MARKED_BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\n )+").unwrap());

static PLAIN_BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

pub fn is_decorator_start(line: &str) -> bool {
    DECORATOR_START.is_match(line)
}

pub fn is_declaration_start(line: &str) -> bool {
    DECLARATION_START.is_match(line)
}

fn decorates_next(line: &str) -> bool {
    is_declaration_start(line) || FIELD_START.is_match(line)
}

/// Drop decorator blocks that no longer sit directly above a declaration.
///
/// Consecutive decorators form one group; a decorator spans lines until its
/// parentheses balance. The whole group survives only if the line after it
/// starts a function, class, method or field, or if its last line carries
/// the decorated member itself.
pub fn filter_stray_decorators(lines: &[String]) -> Vec<String> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if !is_decorator_start(&lines[i]) {
            kept.push(lines[i].clone());
            i += 1;
            continue;
        }

        let group_start = i;
        while i < lines.len() && is_decorator_start(&lines[i]) {
            i = decorator_end(lines, i) + 1;
        }

        let inline = INLINE_DECORATED.is_match(&lines[i - 1]);
        if inline || (i < lines.len() && decorates_next(&lines[i])) {
            kept.extend_from_slice(&lines[group_start..i]);
        }
    }

    kept
}

/// Index of the last line of the decorator starting at `start`.
fn decorator_end(lines: &[String], start: usize) -> usize {
    let mut depth: i64 = 0;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
        if depth == 0 {
            return idx;
        }
    }
    lines.len() - 1
}

/// Collapse runs of blank lines left behind by removed declarations.
pub fn collapse_blank_runs(text: &str, annotation: Annotation) -> String {
    match annotation {
        Annotation::LineNumbers => NUMBERED_BLANK_RUN.replace_all(text, "$1").into_owned(),
        Annotation::EditMarkers => MARKED_BLANK_RUN.replace_all(text, "\n ").into_owned(),
        Annotation::Plain => PLAIN_BLANK_RUN.replace_all(text, "\n\n").into_owned(),
    }
}

use super::slice::print_diagnostics;
use super::{load_config, print_json, read_file};
use crate::cli::OutputFormat;
use crate::diff::{edited_files, split_by_file};
use crate::error::Error;
use crate::paths::{FileLayout, FileRole};
use crate::slice::{Annotation, SliceOptions};
use crate::{slice_patch, FileSlice};
use colored::Colorize;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
struct PatchEntry<'a> {
    role: FileRole,
    #[serde(flatten)]
    slice: &'a FileSlice,
}

pub fn run(
    diff: &Path,
    root: &Path,
    only: Option<FileRole>,
    annotate: Option<Annotation>,
    layout: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Error> {
    let layout: FileLayout = load_config(layout)?;
    let diff_text = read_file(diff)?;

    let sources = read_pre_images(root, &diff_text);
    let options = SliceOptions {
        annotation: annotate.unwrap_or_default(),
        ..SliceOptions::default()
    };
    let slices = slice_patch(&sources, &diff_text, &options);

    let entries: Vec<PatchEntry> = slices
        .iter()
        .map(|slice| PatchEntry {
            role: layout.role(&slice.path),
            slice,
        })
        .filter(|entry| only.is_none_or(|role| entry.role == role))
        .collect();

    if format == OutputFormat::Json {
        print_json(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No matching files in diff".dimmed());
        return Ok(());
    }

    let skipped: Vec<String> = edited_files(&diff_text)
        .into_iter()
        .filter(|path| slices.iter().all(|s| &s.path != path))
        .collect();

    for entry in &entries {
        println!(
            "{} {} {}",
            "==>".cyan(),
            entry.slice.path.bold(),
            format!("({})", role_label(entry.role)).dimmed()
        );
        print_diagnostics(&entry.slice.outcome);
        println!("{}\n", entry.slice.outcome.text);
    }
    for path in &skipped {
        println!("  {} {path} (no pre-image under {})", "→".dimmed(), root.display());
    }

    Ok(())
}

/// Pre-images keyed by the path each file section is known by. Created files
/// have none; unreadable files are left out so they are skipped.
fn read_pre_images(root: &Path, diff_text: &str) -> BTreeMap<String, String> {
    let mut sources = BTreeMap::new();
    for file in split_by_file(diff_text) {
        let (Some(key), Some(old_path)) = (file.path(), file.old_path.as_deref()) else {
            continue;
        };
        match std::fs::read_to_string(root.join(old_path)) {
            Ok(text) => {
                sources.insert(key.to_owned(), text);
            }
            Err(e) => debug!("[patch] cannot read pre-image {old_path}: {e}"),
        }
    }
    sources
}

fn role_label(role: FileRole) -> &'static str {
    match role {
        FileRole::Test => "test",
        FileRole::Source => "source",
        FileRole::Other => "other",
    }
}

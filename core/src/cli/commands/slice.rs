use super::{display_name, load_config, print_json, read_file};
use crate::cli::OutputFormat;
use crate::error::Error;
use crate::slice::{Annotation, Revision, SliceOptions};
use crate::{slice_file_with, Degradation, SliceOutcome};
use colored::Colorize;
use std::path::Path;

/// Command-line flags that override the loaded options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub post: bool,
    pub annotate: Option<Annotation>,
}

impl Overrides {
    fn apply(self, mut options: SliceOptions) -> SliceOptions {
        if self.post {
            options.revision = Revision::Post;
        }
        if let Some(annotation) = self.annotate {
            options.annotation = annotation;
        }
        options
    }
}

pub fn run(
    before: &Path,
    diff: &Path,
    after: Option<&Path>,
    overrides: Overrides,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Error> {
    let options = overrides.apply(load_config(config)?);
    let before_text = read_file(before)?;
    let diff_text = read_file(diff)?;
    let after_text = after.map(read_file).transpose()?;

    let outcome = slice_file_with(
        &before_text,
        after_text.as_deref(),
        &diff_text,
        &display_name(before),
        &options,
    );

    if format == OutputFormat::Json {
        print_json(&outcome);
    } else {
        print_diagnostics(&outcome);
        println!("{}", outcome.text);
    }

    Ok(())
}

/// Degradations and skipped hunks go to stderr so stdout stays the slice.
pub(super) fn print_diagnostics(outcome: &SliceOutcome) {
    match &outcome.degraded {
        Some(Degradation::Unparseable(failure)) => {
            eprintln!("{} not sliced: {failure}", "!".yellow());
        }
        Some(Degradation::MissingPostImage(err)) => {
            eprintln!("{} post-image unavailable: {err}", "!".yellow());
        }
        None => {}
    }
    for hunk in &outcome.malformed {
        eprintln!("  {} skipped {hunk}", "→".dimmed());
    }
}

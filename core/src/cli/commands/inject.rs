use super::{display_name, print_json, read_file};
use crate::cli::OutputFormat;
use crate::diff::unified_diff;
use crate::error::Error;
use crate::inject::{inject, inject_into_suite};
use crate::syntax::SourceLanguage;
use crate::testcases::TestSyntax;
use colored::Colorize;
use std::path::Path;

pub fn run(
    file: &Path,
    fragment: &Path,
    suite: Option<&str>,
    write: bool,
    as_diff: bool,
    format: OutputFormat,
) -> Result<(), Error> {
    let file_text = read_file(file)?;
    let fragment_text = read_file(fragment)?;
    let path = display_name(file);
    let language = SourceLanguage::from_path(&path).unwrap_or_default();
    let syntax = TestSyntax::default();

    let injected = match suite {
        Some(suite) => inject_into_suite(&file_text, &fragment_text, suite, language, &syntax)?,
        None => inject(&file_text, &fragment_text, language, &syntax)?,
    };

    if write {
        std::fs::write(file, &injected)
            .map_err(|e| Error::io(format!("{}: {e}", file.display())))?;
    }

    let patch = as_diff.then(|| unified_diff(&file_text, &injected, &path));
    let text = (!write && !as_diff).then_some(&injected);

    if format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "path": path,
            "written": write,
            "text": text,
            "diff": patch,
        }));
    } else if write {
        println!("{} Injected fragment into {}", "✓".green(), path.bold());
    } else if let Some(patch) = patch {
        print!("{patch}");
    } else {
        print!("{injected}");
    }

    Ok(())
}

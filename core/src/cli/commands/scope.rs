use super::{display_name, print_json, read_file};
use crate::cli::OutputFormat;
use crate::error::Error;
use crate::line_scope_of;
use crate::syntax::SyntaxTree;
use colored::Colorize;
use std::path::Path;

pub fn run(file: &Path, line: usize, format: OutputFormat) -> Result<(), Error> {
    let text = read_file(file)?;
    let tree = SyntaxTree::parse_path(&text, &display_name(file))?;
    let scope = line_scope_of(&tree, line);

    if format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "line": line,
            "scope": scope,
            "global": scope.is_global(),
        }));
    } else {
        let source_line = text.lines().nth(line.saturating_sub(1)).unwrap_or_default();
        println!("{} {}", format!("{line}:").dimmed(), scope.to_string().bold());
        if !source_line.trim().is_empty() {
            println!("  {}", source_line.trim().dimmed());
        }
    }

    Ok(())
}

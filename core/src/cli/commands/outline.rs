use super::{display_name, print_json, read_file};
use crate::cli::OutputFormat;
use crate::error::Error;
use crate::slice::{slice_leading_definitions, Annotation};
use crate::syntax::SyntaxTree;
use std::collections::BTreeSet;
use std::path::Path;

pub fn run(file: &Path, limit: usize, format: OutputFormat) -> Result<(), Error> {
    let text = read_file(file)?;
    let tree = SyntaxTree::parse_path(&text, &display_name(file))?;
    let outline = slice_leading_definitions(&tree, limit);

    if format == OutputFormat::Json {
        print_json(&outline);
    } else {
        println!("{}", outline.render(Annotation::Plain, &BTreeSet::new()));
    }

    Ok(())
}

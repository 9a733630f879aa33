pub mod inject;
pub mod outline;
pub mod patch;
pub mod scope;
pub mod slice;

use crate::error::Error;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Serialize a value as pretty-printed JSON and print it to stdout.
fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("failed to serialize JSON output")
    );
}

fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::io(format!("{}: {e}", path.display())))
}

/// Load options from a JSON file, or their defaults when no file is given.
fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, Error> {
    match path {
        Some(path) => {
            let text = read_file(path)?;
            serde_json::from_str(&text)
                .map_err(|e| Error::config(format!("{}: {e}", path.display())))
        }
        None => Ok(T::default()),
    }
}

/// Name used for language detection and messages.
fn display_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

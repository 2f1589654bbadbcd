//! Export functionality for the stored range data.
//!
//! Pure serialization of the already-built range set: CSV and JSON views of
//! the tables the last build persisted, plus per-country statistics.

mod csv;
mod json;
mod stats;

pub use csv::{export_csv, export_csv_v6};
pub use json::export_json;
pub use stats::export_stats;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

/// The export writer: a file when a path is given, stdout otherwise.
fn open_output(output: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .context(format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

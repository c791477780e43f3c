//! Diff command implementation

use crate::cli::OutputFormat;
use crate::commands::Outcome;
use crate::formatters::{format_diff, load_tree};
use anyhow::Result;
use opdrift_core::sorted_diff;
use std::path::Path;
use tracing::info;

/// Execute diff command
///
/// Prints the sorted diff entries; any entry is a finding.
pub fn cmd_diff(first: &Path, second: &Path, prefix: &str, format: OutputFormat) -> Result<Outcome> {
    info!("Diffing {} against {}", first.display(), second.display());

    let a = load_tree(first)?;
    let b = load_tree(second)?;
    let entries = sorted_diff(prefix, &a, &b);

    let json = format == OutputFormat::Json;
    if json || !entries.is_empty() {
        println!("{}", format_diff(&entries, json)?);
    }

    if entries.is_empty() {
        info!("No differences found");
        Ok(Outcome::Clean)
    } else {
        info!("{} differences found", entries.len());
        Ok(Outcome::Findings)
    }
}

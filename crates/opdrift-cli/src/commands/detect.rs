//! Detect command implementations
//!
//! Handles schema version detection from deployment records and from
//! op-deployer binary version strings.

use crate::cli::OutputFormat;
use crate::commands::Outcome;
use crate::formatters::load_tree;
use anyhow::Result;
use opdrift_core::{detect_from_binary_version, detect_schema_version, SchemaVersion};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Serialize)]
struct DetectReport<'a> {
    source: &'a str,
    version: SchemaVersion,
}

fn print_version(source: &str, version: SchemaVersion, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", version),
        OutputFormat::Json => {
            let report = DetectReport { source, version };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Execute detect command
pub fn cmd_detect(record_path: &Path, format: OutputFormat) -> Result<Outcome> {
    info!("Detecting schema version of {}", record_path.display());

    let record = load_tree(record_path)?;
    let version = detect_schema_version(&record);
    print_version(&record_path.display().to_string(), version, format)?;

    if version.is_known() {
        Ok(Outcome::Clean)
    } else {
        warn!("{} has an unrecognized contracts locator", record_path.display());
        Ok(Outcome::Findings)
    }
}

/// Execute detect-binary command
pub fn cmd_detect_binary(binary_version: &str, format: OutputFormat) -> Result<Outcome> {
    let version = detect_from_binary_version(binary_version)?;
    print_version(binary_version, version, format)?;
    Ok(Outcome::Clean)
}

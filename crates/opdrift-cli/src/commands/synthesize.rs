//! Synthesize command implementation

use crate::commands::Outcome;
use crate::formatters::write_config;
use anyhow::{Context, Result};
use opdrift_core::{synthesize, SchemaVersion, StandardsCatalog};
use std::path::Path;
use tracing::info;

/// Execute synthesize command
pub fn cmd_synthesize(
    catalog: &StandardsCatalog,
    version: SchemaVersion,
    l1_chain_id: u64,
    release: &str,
    output_dir: &Path,
) -> Result<Outcome> {
    info!(
        "Synthesizing {} standard for L1 chain {} at {}",
        version, l1_chain_id, release
    );

    let config = synthesize(catalog, version, l1_chain_id, release)
        .with_context(|| format!("failed to synthesize the {} standard template", version))?;
    write_config(&config, output_dir)?;

    println!("Standard configuration written to {}", output_dir.display());
    Ok(Outcome::Clean)
}

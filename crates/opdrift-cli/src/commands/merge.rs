//! Merge command implementations
//!
//! Handles merging single deployment records and batches of records onto
//! the standard templates.

use crate::commands::Outcome;
use crate::formatters::{load_tree, write_config};
use anyhow::{anyhow, bail, Context, Result};
use opdrift_core::{detect_schema_version, merge_user_state, SchemaVersion, StandardsCatalog};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

/// Detect, merge and write one record
fn merge_record(catalog: &StandardsCatalog, record_path: &Path, output_dir: &Path) -> Result<SchemaVersion> {
    let record = load_tree(record_path)?;

    let version = detect_schema_version(&record);
    if !version.is_known() {
        bail!(
            "cannot merge {}: unrecognized schema version",
            record_path.display()
        );
    }

    let merged = merge_user_state(catalog, &record, version)
        .with_context(|| format!("failed to merge {}", record_path.display()))?;
    write_config(&merged, output_dir)?;
    Ok(version)
}

/// Execute merge command
pub fn cmd_merge(catalog: &StandardsCatalog, record_path: &Path, output_dir: &Path) -> Result<Outcome> {
    info!("Merging {} onto the standard template", record_path.display());

    let version = merge_record(catalog, record_path, output_dir)?;

    println!(
        "Merged {} ({}) into {}",
        record_path.display(),
        version,
        output_dir.display()
    );
    Ok(Outcome::Clean)
}

/// Output subdirectory of a record in a batch, named after its file stem
fn record_output_dir(output_dir: &Path, record_path: &Path) -> Result<PathBuf> {
    let stem = record_path
        .file_stem()
        .ok_or_else(|| anyhow!("{} has no file name", record_path.display()))?;
    Ok(output_dir.join(stem))
}

/// Execute merge-all command
///
/// Every record is merged even when others fail; all failures are reported
/// at the end.
pub async fn cmd_merge_all(
    catalog: StandardsCatalog,
    records: &[PathBuf],
    output_dir: &Path,
    jobs: usize,
) -> Result<Outcome> {
    if jobs == 0 {
        bail!("--jobs must be at least 1");
    }

    let mut targets = Vec::with_capacity(records.len());
    let mut seen = BTreeSet::new();
    for record in records {
        let target = record_output_dir(output_dir, record)?;
        if !seen.insert(target.clone()) {
            bail!(
                "two records would be written to {}; rename one of them",
                target.display()
            );
        }
        targets.push(target);
    }

    info!(
        "Merging {} records with {} parallel workers",
        records.len(),
        jobs
    );

    let catalog = Arc::new(catalog);
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(records.len());

    for (record, target) in records.iter().cloned().zip(targets) {
        let catalog = Arc::clone(&catalog);
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("merge worker pool closed")?;

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = merge_record(&catalog, &record, &target);
            (record, target, result)
        });
        handles.push(handle);
    }

    let mut failures = 0usize;
    for handle in handles {
        let (record, target, result) = handle.await.context("merge task panicked")?;
        match result {
            Ok(version) => println!(
                "Merged {} ({}) into {}",
                record.display(),
                version,
                target.display()
            ),
            Err(err) => {
                failures += 1;
                eprintln!("Error merging {}: {:#}", record.display(), err);
            }
        }
    }

    println!(
        "Merged {} of {} records",
        records.len() - failures,
        records.len()
    );

    if failures == 0 {
        Ok(Outcome::Clean)
    } else {
        Ok(Outcome::Findings)
    }
}

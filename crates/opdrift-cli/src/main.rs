//! CLI tool for op-deployer configuration reconciliation
//!
//! This binary provides the `opdrift` command-line interface for detecting
//! schema versions, synthesizing standard templates, merging deployment
//! records and diffing configurations.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod formatters;

use cli::{Cli, Commands};
use commands::{cmd_detect, cmd_detect_binary, cmd_diff, cmd_merge, cmd_merge_all, cmd_synthesize};
use formatters::load_catalog;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let standards_dir = cli.standards_dir.as_deref();
    let outcome = match cli.command {
        Commands::Detect { record } => cmd_detect(&record, cli.format)?,

        Commands::DetectBinary { binary_version } => cmd_detect_binary(&binary_version, cli.format)?,

        Commands::Synthesize {
            schema_version,
            l1_chain_id,
            release,
            output,
        } => {
            let catalog = load_catalog(standards_dir)?;
            cmd_synthesize(&catalog, schema_version, l1_chain_id, &release, &output)?
        }

        Commands::Merge { record, output } => {
            let catalog = load_catalog(standards_dir)?;
            cmd_merge(&catalog, &record, &output)?
        }

        Commands::MergeAll {
            records,
            output,
            jobs,
        } => {
            let catalog = load_catalog(standards_dir)?;
            cmd_merge_all(catalog, &records, &output, jobs).await?
        }

        Commands::Diff {
            first,
            second,
            prefix,
        } => cmd_diff(&first, &second, &prefix, cli.format)?,
    };

    std::process::exit(outcome.exit_code());
}

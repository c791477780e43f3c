//! Command-line interface definitions for the opdrift CLI tool
//!
//! This module contains all the clap-related structures for argument parsing
//! and command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use opdrift_core::SchemaVersion;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    #[value(name = "text")]
    Text,
    /// Machine-readable JSON
    #[value(name = "json")]
    Json,
}

#[derive(Parser)]
#[command(name = "opdrift")]
#[command(about = "Reconcile op-deployer chain configurations against the standard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory with roles.toml and versions.toml overriding the built-in standards
    #[arg(long, global = true, env = "OPDRIFT_STANDARDS_DIR", value_name = "DIR")]
    pub standards_dir: Option<PathBuf>,

    /// Output format for detect and diff results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect the schema version of a deployment record
    Detect {
        /// Deployment record (state.json)
        #[arg(value_name = "RECORD")]
        record: PathBuf,
    },

    /// Map an op-deployer binary version to a schema version
    DetectBinary {
        /// Binary version string (e.g., 'op-deployer/v0.2.0')
        #[arg(value_name = "VERSION")]
        binary_version: String,
    },

    /// Write the standard intent and state for a network and release
    Synthesize {
        /// Schema version (v1, v2, v3 or v4)
        #[arg(long = "version", value_name = "VERSION")]
        schema_version: SchemaVersion,

        /// L1 chain id of the network
        #[arg(long)]
        l1_chain_id: u64,

        /// Contracts release tag (e.g., 'op-contracts/v1.6.0')
        #[arg(long)]
        release: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Merge a deployment record onto the standard template
    Merge {
        /// Deployment record (state.json)
        #[arg(value_name = "RECORD")]
        record: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Merge many deployment records in parallel
    MergeAll {
        /// Deployment records
        #[arg(value_name = "RECORDS", required = true)]
        records: Vec<PathBuf>,

        /// Output directory; each record gets a subdirectory named after its file
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum number of concurrent merges
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Structurally diff two configuration files
    Diff {
        /// First file (JSON, or TOML with a .toml extension)
        #[arg(value_name = "FIRST")]
        first: PathBuf,

        /// Second file
        #[arg(value_name = "SECOND")]
        second: PathBuf,

        /// Path prefix for reported entries
        #[arg(long, default_value = "")]
        prefix: String,
    },
}

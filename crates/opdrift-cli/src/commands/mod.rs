//! Command implementations for the opdrift CLI tool
//!
//! This module contains the implementation of all CLI commands, organized by functionality.

pub mod detect;
pub mod diff;
pub mod merge;
pub mod synthesize;

pub use detect::{cmd_detect, cmd_detect_binary};
pub use diff::cmd_diff;
pub use merge::{cmd_merge, cmd_merge_all};
pub use synthesize::cmd_synthesize;

/// Result of a command that completed without an operational error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report
    Clean,
    /// The command found drift, an unknown version or failed merges
    Findings,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Clean => 0,
            Outcome::Findings => 1,
        }
    }
}

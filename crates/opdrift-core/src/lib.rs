//! Core engine for op-deployer configuration reconciliation
//!
//! This crate detects the schema version of op-deployer deployment records,
//! synthesizes the standard intent and state for a network and release,
//! merges a user's record onto that standard and diffs the regenerated
//! artifact against the one the operator declared.
//!
//! # Features
//!
//! - **Opaque trees**: documents are handled as untyped `serde_json` trees
//!   addressed by path selectors such as `chains.[0].roles.batcher`
//! - **Version aware**: four historical record shapes, detected from the
//!   contracts locator or the deployer binary version
//! - **Non-fail-fast merging**: every missing field of a record is reported
//!   in one pass
//! - **Numeric tolerance**: `1` and `1.0` never show up as drift
//!
//! # Usage
//!
//! ```rust,ignore
//! use opdrift_core::{detect_schema_version, merge_user_state, StandardsCatalog};
//!
//! let catalog = StandardsCatalog::embedded();
//! let version = detect_schema_version(&record);
//! let merged = merge_user_state(&catalog, &record, version)?;
//! ```

// Module declarations
pub mod diff;
pub mod error;
pub mod merge;
pub mod reconcile;
pub mod selector;
pub mod standards;
pub mod template;
pub mod traits;
pub mod tree;
pub mod version;

// Re-export the engine boundary for convenience
pub use diff::{diff_trees, diff_value, sorted_diff};
pub use error::{
    AggregatedError, CatalogError, FieldError, GeneratorError, MergeError, ReconcileError,
    SelectorError, TemplateError, TreeError, VersionError,
};
pub use merge::{field_table, merge_user_state, FieldCopy, Side};
pub use reconcile::{ReconcileReport, Reconciler};
pub use selector::{Segment, Selector};
pub use standards::{StandardContract, StandardsCatalog};
pub use template::{synthesize, DeploymentConfig};
pub use traits::ArtifactGenerator;
pub use tree::Tree;
pub use version::{detect_from_binary_version, detect_schema_version, SchemaVersion};

//! Error types for opdrift-core
//!
//! This module defines the errors that can occur while evaluating selectors,
//! detecting schema versions, loading the standards catalog, synthesizing
//! standard templates and merging user records. Structural diffs are never
//! errors and have no type here.

use std::fmt;

use crate::version::SchemaVersion;

/// Errors produced while parsing a path selector expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector string was empty
    #[error("empty selector")]
    Empty,
    /// A dotted segment was empty (e.g. `a..b` or a trailing dot)
    #[error("empty segment at position {position} in selector '{selector}'")]
    EmptySegment { selector: String, position: usize },
    /// A `[` was not closed, or text followed a `]` without a dot
    #[error("malformed brackets in selector '{selector}'")]
    MalformedBracket { selector: String },
    /// A bracketed index was neither a non-negative integer nor `#`
    #[error("invalid index '{index}' in selector '{selector}'")]
    InvalidIndex { selector: String, index: String },
    /// The `[#]` length query was followed by more segments
    #[error("length query must be the last segment of selector '{selector}'")]
    LengthNotLast { selector: String },
}

/// Errors produced while reading from or writing to an opaque tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A segment along the selector was absent or addressed the wrong kind of node
    #[error("'{selector}' not found: no value at segment '{segment}'")]
    NotFound { selector: String, segment: String },
    /// The node exists but does not hold the kind of value the caller needs
    #[error("'{selector}' has unexpected kind: expected {expected}, found {found}")]
    UnexpectedKind {
        selector: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The write could not be applied to the destination tree
    #[error("cannot write '{selector}': {reason}")]
    InvalidWrite { selector: String, reason: String },
    /// The selector string could not be parsed
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Errors produced while classifying deployer binary versions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The string is not of the form `tool/vMAJOR.MINOR.PATCH`
    #[error("malformed binary version '{0}'")]
    Malformed(String),
    /// The version parsed but maps to no known schema version
    #[error("unsupported binary version '{0}'")]
    UnsupportedVersion(String),
}

/// Errors produced while loading a standards catalog from TOML
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The roles or versions document is not valid TOML for the expected shape
    #[error("failed to parse {document}: {source}")]
    Parse {
        document: &'static str,
        #[source]
        source: toml::de::Error,
    },
    /// Two networks claim the same L1 chain id
    #[error("L1 chain id {0} is assigned to more than one network")]
    DuplicateChainId(u64),
    /// The versions document names a network the roles document does not define
    #[error("versions declared for unknown network '{0}'")]
    UnknownNetwork(String),
}

/// Errors produced while synthesizing a standard template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The schema version is `Unknown` or otherwise has no template
    #[error("unsupported schema version '{0}'")]
    UnsupportedVersion(SchemaVersion),
    /// No roles are configured for the L1 chain id
    #[error("unsupported L1 chain id {0}")]
    UnsupportedChain(u64),
    /// The network has no standard versions for the release tag
    #[error("no standard release '{tag}' for network '{network}'")]
    UnsupportedRelease { network: String, tag: String },
    /// A catalog address is not a 20-byte hex string
    #[error("invalid address '{address}' for {contract}")]
    InvalidAddress { contract: String, address: String },
    /// Writing into the template failed
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// One failed field copy recorded during a merge
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {error}")]
pub struct FieldError {
    /// Fully qualified source location of the field in the user record
    pub field: String,
    /// The underlying evaluator error
    #[source]
    pub error: TreeError,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: TreeError) -> Self {
        Self {
            field: field.into(),
            error,
        }
    }
}

/// A collection of field errors gathered in a single non-fail-fast pass
///
/// Merging a malformed record reports every missing or invalid field at once
/// so that the file can be fixed in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedError {
    errors: Vec<FieldError>,
}

impl AggregatedError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Names of every field that failed, in the order they were recorded
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), AggregatedError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "field" } else { "fields" };
        write!(f, "{} {} failed to merge:", self.errors.len(), noun)?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedError {}

impl IntoIterator for AggregatedError {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Errors produced by the state merger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The schema version is `Unknown`
    #[error("unsupported schema version '{0}'")]
    UnsupportedVersion(SchemaVersion),
    /// The standard template could not be synthesized
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// One or more fields of the user record could not be copied
    #[error(transparent)]
    Fields(#[from] AggregatedError),
    /// The merge produced output that violates the evaluator contract
    #[error("internal merge error: {0}")]
    Internal(String),
}

impl MergeError {
    /// True when the error describes bad input rather than an engine defect
    pub fn is_user_error(&self) -> bool {
        !matches!(self, MergeError::Internal(_))
    }
}

/// Error returned by an artifact generator
#[derive(Debug, thiserror::Error)]
#[error("artifact generation failed: {message}")]
pub struct GeneratorError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GeneratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors produced by the reconciliation pipeline
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The record's schema version could not be detected
    #[error("could not detect the schema version of the deployment record")]
    UnknownVersion,
    /// Merging the record onto the standard template failed
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// The external generator failed to regenerate the artifact
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(selector: &str) -> TreeError {
        TreeError::NotFound {
            selector: selector.into(),
            segment: selector.into(),
        }
    }

    #[test]
    fn test_aggregated_error_collects_all() {
        let mut errors = AggregatedError::new();
        assert!(errors.is_empty());

        errors.add(FieldError::new("appliedIntent.l1ContractsLocator", missing("l1ContractsLocator")));
        errors.add(FieldError::new("create2Salt", missing("create2Salt")));

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.fields(),
            vec!["appliedIntent.l1ContractsLocator", "create2Salt"]
        );

        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 fields failed to merge:"));
        assert!(rendered.contains("\n  - create2Salt: 'create2Salt' not found"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_aggregate_is_ok() {
        assert!(AggregatedError::new().into_result().is_ok());
    }

    #[test]
    fn test_internal_errors_are_not_user_errors() {
        assert!(!MergeError::Internal("boom".into()).is_user_error());
        assert!(MergeError::UnsupportedVersion(SchemaVersion::Unknown).is_user_error());
        assert!(MergeError::Fields(AggregatedError::new()).is_user_error());
    }
}

//! The reconciliation pipeline
//!
//! Runs detect, merge, generate and diff over one deployment record and
//! reports whether the declared artifact matches what the standard
//! configuration would produce.

use tracing::{debug, info};

use crate::diff::sorted_diff;
use crate::error::ReconcileError;
use crate::merge::merge_user_state;
use crate::standards::StandardsCatalog;
use crate::template::DeploymentConfig;
use crate::traits::ArtifactGenerator;
use crate::tree::Tree;
use crate::version::{detect_schema_version, SchemaVersion};

/// Prefix of diff entries produced by [`Reconciler::reconcile`]
pub const ARTIFACT_DIFF_PREFIX: &str = "artifact";

/// Outcome of reconciling one record
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub version: SchemaVersion,
    /// The standard template with the record's fields merged in
    pub merged: DeploymentConfig,
    /// Sorted differences between the regenerated and the declared artifact
    pub diff: Vec<String>,
}

impl ReconcileReport {
    /// True when the declared artifact is exactly what the standard produces
    pub fn matches_standard(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Drives the reconciliation pipeline with a caller-supplied generator
pub struct Reconciler<'a, G> {
    catalog: &'a StandardsCatalog,
    generator: G,
}

impl<'a, G: ArtifactGenerator> Reconciler<'a, G> {
    pub fn new(catalog: &'a StandardsCatalog, generator: G) -> Self {
        Self { catalog, generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Reconcile `record` against the artifact the operator declared
    ///
    /// The regenerated artifact is the first side of the diff, the declared
    /// artifact the second.
    pub fn reconcile(&self, record: &Tree, declared: &Tree) -> Result<ReconcileReport, ReconcileError> {
        let version = detect_schema_version(record);
        if !version.is_known() {
            return Err(ReconcileError::UnknownVersion);
        }

        let merged = merge_user_state(self.catalog, record, version)?;
        let regenerated = self.generator.generate(&merged.intent, &merged.state)?;
        let diff = sorted_diff(ARTIFACT_DIFF_PREFIX, &regenerated, declared);

        if diff.is_empty() {
            debug!(%version, "declared artifact matches the standard configuration");
        } else {
            info!(%version, differences = diff.len(), "declared artifact drifts from the standard configuration");
        }

        Ok(ReconcileReport {
            version,
            merged,
            diff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GeneratorError, MergeError};
    use crate::selector::write_str;
    use serde_json::json;

    struct StateEcho;

    impl ArtifactGenerator for StateEcho {
        fn generate(&self, _intent: &Tree, state: &Tree) -> Result<Tree, GeneratorError> {
            Ok(state.clone())
        }
    }

    struct Failing;

    impl ArtifactGenerator for Failing {
        fn generate(&self, _intent: &Tree, _state: &Tree) -> Result<Tree, GeneratorError> {
            Err(GeneratorError::new("op-deployer exited with status 1"))
        }
    }

    fn v3_record() -> Tree {
        let mut record = Tree::new();
        let intent = [
            ("l1ContractsLocator", json!("tag://op-contracts/v2.0.0")),
            ("l2ContractsLocator", json!("tag://op-contracts/v2.0.0")),
            ("l1ChainID", json!(1)),
            ("chains.[0].id", json!("0x00000000000000000000000000000000000000000000000000000000000a4b1")),
            ("chains.[0].baseFeeVaultRecipient", json!("0x01")),
            ("chains.[0].l1FeeVaultRecipient", json!("0x02")),
            ("chains.[0].sequencerFeeVaultRecipient", json!("0x03")),
            ("chains.[0].eip1559DenominatorCanyon", json!(250)),
            ("chains.[0].eip1559Denominator", json!(50)),
            ("chains.[0].eip1559Elasticity", json!(6)),
            ("chains.[0].gasLimit", json!(60000000)),
            ("chains.[0].roles.l1ProxyAdminOwner", json!("0x04")),
            ("chains.[0].roles.l2ProxyAdminOwner", json!("0x05")),
            ("chains.[0].roles.systemConfigOwner", json!("0x06")),
            ("chains.[0].roles.unsafeBlockSigner", json!("0x07")),
            ("chains.[0].roles.batcher", json!("0x08")),
            ("chains.[0].roles.proposer", json!("0x09")),
            ("chains.[0].roles.challenger", json!("0x0a")),
        ];
        for (path, value) in intent {
            write_str(&mut record, &format!("appliedIntent.{}", path), value).unwrap();
        }
        for field in crate::merge::field_table(SchemaVersion::V3).unwrap() {
            if field.side == crate::merge::Side::State {
                crate::selector::write(&mut record, &field.source, json!("0xfeed")).unwrap();
            }
        }
        record
    }

    #[test]
    fn test_matching_artifact() {
        let catalog = StandardsCatalog::embedded();
        let record = v3_record();
        let expected = merge_user_state(&catalog, &record, SchemaVersion::V3).unwrap();

        let reconciler = Reconciler::new(&catalog, StateEcho);
        let report = reconciler.reconcile(&record, &expected.state).unwrap();
        assert_eq!(report.version, SchemaVersion::V3);
        assert!(report.matches_standard());
        assert_eq!(report.merged, expected);
    }

    #[test]
    fn test_drifting_artifact() {
        let catalog = StandardsCatalog::embedded();
        let record = v3_record();
        let mut declared = merge_user_state(&catalog, &record, SchemaVersion::V3).unwrap().state;
        write_str(&mut declared, "create2Salt", json!("0xbeef")).unwrap();

        let report = Reconciler::new(&catalog, StateEcho)
            .reconcile(&record, &declared)
            .unwrap();
        assert!(!report.matches_standard());
        assert_eq!(
            report.diff,
            vec!["artifact.create2Salt: value mismatch (0xfeed vs 0xbeef)"]
        );
    }

    #[test]
    fn test_unknown_version() {
        let catalog = StandardsCatalog::embedded();
        let mut record = v3_record();
        write_str(&mut record, "appliedIntent.l1ContractsLocator", json!("tag://op-contracts/v9.0.0")).unwrap();

        let err = Reconciler::new(&catalog, StateEcho)
            .reconcile(&record, &Tree::new())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::UnknownVersion));
    }

    #[test]
    fn test_merge_failure_propagates() {
        let catalog = StandardsCatalog::embedded();
        let mut record = v3_record();
        record.remove("create2Salt");

        let err = Reconciler::new(&catalog, StateEcho)
            .reconcile(&record, &Tree::new())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Merge(MergeError::Fields(_))));
    }

    #[test]
    fn test_generator_failure_propagates() {
        let catalog = StandardsCatalog::embedded();
        let generator = Failing;
        let err = Reconciler::new(&catalog, &generator)
            .reconcile(&v3_record(), &Tree::new())
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Generator(_)));
        assert!(err.to_string().contains("op-deployer exited"));
    }
}

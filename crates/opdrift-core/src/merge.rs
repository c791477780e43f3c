//! Merging user deployment records onto standard templates
//!
//! A user record is an op-deployer `state.json` whose `appliedIntent` holds
//! the intent the chain was deployed with. The merger synthesizes the
//! standard template for the record's L1 network and release, then copies a
//! fixed, version-specific list of fields from the record onto it. Every
//! field that fails to copy is collected; the merge only succeeds if none do.

use serde_json::Value;
use tracing::debug;

use crate::error::{AggregatedError, FieldError, MergeError, TreeError};
use crate::selector::{copy, read, write, Selector};
use crate::standards::StandardsCatalog;
use crate::template::{synthesize, DeploymentConfig};
use crate::tree::{kind_name, values_equal, Tree};
use crate::version::{release_tag, SchemaVersion};

/// Key of the applied intent inside a user record
pub const APPLIED_INTENT_KEY: &str = "appliedIntent";

/// Which synthesized tree a field is copied onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Copied from `appliedIntent` onto the intent
    Intent,
    /// Copied from the record root onto the state
    State,
}

/// One entry of a version's field table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCopy {
    pub side: Side,
    pub source: Selector,
    pub dest: Selector,
}

impl FieldCopy {
    /// Location of the source field relative to the record root
    pub fn qualified_source(&self) -> String {
        match self.side {
            Side::Intent => format!("{}.{}", APPLIED_INTENT_KEY, self.source),
            Side::State => self.source.to_string(),
        }
    }
}

const INTENT_FIELDS: &[&str] = &[
    "l1ContractsLocator",
    "l2ContractsLocator",
    "chains.[0].id",
    "chains.[0].baseFeeVaultRecipient",
    "chains.[0].l1FeeVaultRecipient",
    "chains.[0].sequencerFeeVaultRecipient",
    "chains.[0].eip1559DenominatorCanyon",
    "chains.[0].eip1559Denominator",
    "chains.[0].eip1559Elasticity",
    "chains.[0].roles.l1ProxyAdminOwner",
    "chains.[0].roles.l2ProxyAdminOwner",
    "chains.[0].roles.systemConfigOwner",
    "chains.[0].roles.unsafeBlockSigner",
    "chains.[0].roles.batcher",
    "chains.[0].roles.proposer",
    "chains.[0].roles.challenger",
];

/// Only intents of V3 and later carry a gas limit
const GAS_LIMIT_FIELD: &str = "chains.[0].gasLimit";

const LEGACY_STATE_FIELDS: &[&str] = &[
    "create2Salt",
    "superchainDeployment.proxyAdminAddress",
    "superchainDeployment.superchainConfigProxyAddress",
    "superchainDeployment.protocolVersionsProxyAddress",
    "opChainDeployments.[0].id",
    "opChainDeployments.[0].proxyAdminAddress",
    "opChainDeployments.[0].addressManagerAddress",
    "opChainDeployments.[0].l1ERC721BridgeProxyAddress",
    "opChainDeployments.[0].systemConfigProxyAddress",
    "opChainDeployments.[0].optimismMintableERC20FactoryProxyAddress",
    "opChainDeployments.[0].l1StandardBridgeProxyAddress",
    "opChainDeployments.[0].l1CrossDomainMessengerProxyAddress",
    "opChainDeployments.[0].optimismPortalProxyAddress",
    "opChainDeployments.[0].disputeGameFactoryProxyAddress",
    "opChainDeployments.[0].anchorStateRegistryProxyAddress",
    "opChainDeployments.[0].anchorStateRegistryImplAddress",
    "opChainDeployments.[0].faultDisputeGameAddress",
    "opChainDeployments.[0].permissionedDisputeGameAddress",
    "opChainDeployments.[0].delayedWETHPermissionedGameProxyAddress",
];

const V4_STATE_FIELDS: &[&str] = &[
    "create2Salt",
    "superchainContracts.SuperchainProxyAdminImpl",
    "superchainContracts.SuperchainConfigProxy",
    "superchainContracts.ProtocolVersionsProxy",
    "opChainDeployments.[0].Id",
    "opChainDeployments.[0].OpChainProxyAdminImpl",
    "opChainDeployments.[0].AddressManagerImpl",
    "opChainDeployments.[0].L1Erc721BridgeProxy",
    "opChainDeployments.[0].SystemConfigProxy",
    "opChainDeployments.[0].OptimismMintableErc20FactoryProxy",
    "opChainDeployments.[0].L1StandardBridgeProxy",
    "opChainDeployments.[0].L1CrossDomainMessengerProxy",
    "opChainDeployments.[0].OptimismPortalProxy",
    "opChainDeployments.[0].DisputeGameFactoryProxy",
    "opChainDeployments.[0].AnchorStateRegistryProxy",
    "opChainDeployments.[0].AnchorStateRegistryImpl",
    "opChainDeployments.[0].FaultDisputeGameImpl",
    "opChainDeployments.[0].PermissionedDisputeGameImpl",
    "opChainDeployments.[0].DelayedWethPermissionedGameProxy",
    "opChainDeployments.[0].DelayedWethPermissionlessGameProxy",
    "opChainDeployments.[0].StartBlock",
];

fn parse_entries(side: Side, paths: &[&str]) -> Result<Vec<FieldCopy>, MergeError> {
    paths
        .iter()
        .map(|path| {
            let selector = Selector::parse(path)
                .map_err(|err| MergeError::Internal(format!("invalid field table entry: {}", err)))?;
            Ok(FieldCopy {
                side,
                source: selector.clone(),
                dest: selector,
            })
        })
        .collect()
}

/// The field table of a schema version
///
/// Intent fields come first, then state fields. Source and destination
/// selectors are currently identical; they are kept apart so a table can map
/// a field to a new location.
pub fn field_table(version: SchemaVersion) -> Result<Vec<FieldCopy>, MergeError> {
    let state_fields = match version {
        SchemaVersion::V1 | SchemaVersion::V2 | SchemaVersion::V3 => LEGACY_STATE_FIELDS,
        SchemaVersion::V4 => V4_STATE_FIELDS,
        SchemaVersion::Unknown => return Err(MergeError::UnsupportedVersion(version)),
    };

    let mut table = parse_entries(Side::Intent, INTENT_FIELDS)?;
    if matches!(version, SchemaVersion::V3 | SchemaVersion::V4) {
        table.extend(parse_entries(Side::Intent, &[GAS_LIMIT_FIELD])?);
    }
    table.extend(parse_entries(Side::State, state_fields)?);
    Ok(table)
}

fn missing(selector: &str) -> TreeError {
    TreeError::NotFound {
        selector: selector.to_string(),
        segment: selector.rsplit('.').next().unwrap_or(selector).to_string(),
    }
}

fn read_chain_id(applied_intent: &Tree, errors: &mut AggregatedError) -> Option<u64> {
    let selector = "l1ChainID";
    let field = format!("{}.{}", APPLIED_INTENT_KEY, selector);
    match applied_intent.get(selector) {
        Some(Value::Number(n)) if n.as_u64().is_some() => n.as_u64(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f >= 0.0 && f.fract() == 0.0) => {
            n.as_f64().map(|f| f as u64)
        }
        Some(other) => {
            errors.add(FieldError::new(
                field,
                TreeError::UnexpectedKind {
                    selector: selector.to_string(),
                    expected: "unsigned integer",
                    found: kind_name(other),
                },
            ));
            None
        }
        None => {
            errors.add(FieldError::new(field, missing(selector)));
            None
        }
    }
}

fn read_release_tag(applied_intent: &Tree, errors: &mut AggregatedError) -> Option<String> {
    let selector = "l1ContractsLocator";
    let field = format!("{}.{}", APPLIED_INTENT_KEY, selector);
    match applied_intent.get(selector) {
        Some(Value::String(locator)) => match release_tag(locator) {
            Some(tag) => Some(tag.to_string()),
            None => {
                errors.add(FieldError::new(
                    field,
                    TreeError::UnexpectedKind {
                        selector: selector.to_string(),
                        expected: "tag:// locator",
                        found: "string",
                    },
                ));
                None
            }
        },
        Some(other) => {
            errors.add(FieldError::new(
                field,
                TreeError::UnexpectedKind {
                    selector: selector.to_string(),
                    expected: "string",
                    found: kind_name(other),
                },
            ));
            None
        }
        None => {
            // Reported by the field table, which also copies the locator.
            None
        }
    }
}

/// Merge a user deployment record onto the standard template of `version`
///
/// The L1 chain id and the release tag are taken from the record's applied
/// intent and select the template. Every field in [`field_table`] is then
/// copied; all failures are returned together as [`MergeError::Fields`].
///
/// # Errors
///
/// - [`MergeError::UnsupportedVersion`] for [`SchemaVersion::Unknown`]
/// - [`MergeError::Template`] if the standard template cannot be built
/// - [`MergeError::Fields`] listing every field that could not be copied
/// - [`MergeError::Internal`] if the merged trees do not hold the copied values
pub fn merge_user_state(
    catalog: &StandardsCatalog,
    record: &Tree,
    version: SchemaVersion,
) -> Result<DeploymentConfig, MergeError> {
    let table = field_table(version)?;
    let mut errors = AggregatedError::new();

    let empty = Tree::new();
    let applied_intent = match record.get(APPLIED_INTENT_KEY) {
        Some(Value::Object(map)) => map,
        Some(other) => {
            errors.add(FieldError::new(
                APPLIED_INTENT_KEY,
                TreeError::UnexpectedKind {
                    selector: APPLIED_INTENT_KEY.to_string(),
                    expected: "map",
                    found: kind_name(other),
                },
            ));
            &empty
        }
        None => {
            errors.add(FieldError::new(APPLIED_INTENT_KEY, missing(APPLIED_INTENT_KEY)));
            &empty
        }
    };

    let l1_chain_id = read_chain_id(applied_intent, &mut errors);
    let tag = read_release_tag(applied_intent, &mut errors);

    // Without a chain id or release there is no template, but the table is still
    // walked against scratch trees so every missing field gets reported.
    let template = match (l1_chain_id, tag.as_deref()) {
        (Some(chain_id), Some(tag)) => Some(synthesize(catalog, version, chain_id, tag)?),
        _ => None,
    };
    let (mut intent, mut state) = template
        .map(DeploymentConfig::into_parts)
        .unwrap_or_default();

    for entry in &table {
        let (src, dst) = match entry.side {
            Side::Intent => (applied_intent, &mut intent),
            Side::State => (record, &mut state),
        };
        let copied = match entry.side {
            // The intent is written as TOML, which has no null.
            Side::Intent => read(src, &entry.source).and_then(|value| match value {
                Value::Null => Err(TreeError::UnexpectedKind {
                    selector: entry.source.to_string(),
                    expected: "non-null value",
                    found: "null",
                }),
                value => write(dst, &entry.dest, value),
            }),
            Side::State => copy(src, &entry.source, dst, &entry.dest),
        };
        if let Err(err) = copied {
            errors.add(FieldError::new(entry.qualified_source(), err));
        }
    }

    errors.into_result()?;

    let merged = DeploymentConfig { intent, state };
    verify_merged(&merged, &table, applied_intent, record)?;

    debug!(
        %version,
        fields = table.len(),
        "merged user record onto standard template"
    );
    Ok(merged)
}

/// Check that every copied field reads back with the value it was copied from
fn verify_merged(
    merged: &DeploymentConfig,
    table: &[FieldCopy],
    applied_intent: &Tree,
    record: &Tree,
) -> Result<(), MergeError> {
    for entry in table {
        let (src, dst) = match entry.side {
            Side::Intent => (applied_intent, &merged.intent),
            Side::State => (record, &merged.state),
        };
        let expected = read(src, &entry.source)
            .map_err(|err| MergeError::Internal(format!("source vanished: {}", err)))?;
        let actual = read(dst, &entry.dest).map_err(|err| {
            MergeError::Internal(format!("write to '{}' did not persist: {}", entry.dest, err))
        })?;
        if !values_equal(&expected, &actual) {
            return Err(MergeError::Internal(format!(
                "'{}' holds a different value than was copied",
                entry.dest
            )));
        }
    }
    Ok(())
}

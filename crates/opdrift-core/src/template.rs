//! Standard template synthesis
//!
//! Each schema version ships a canonical intent (TOML) and state (JSON) with
//! zeroed roles and addresses. Synthesis loads a fresh copy of both, writes
//! the superchain roles of the L1 network into the intent and the standard
//! implementation addresses of the requested release into the state.

use serde_json::Value;
use tracing::debug;

use crate::error::TemplateError;
use crate::selector::write_str;
use crate::standards::{RolesConfig, StandardContract, StandardsCatalog};
use crate::tree::{tree_from_json, tree_from_toml, Tree};
use crate::version::SchemaVersion;

/// Protocol versions owner forced into every V1 intent
///
/// Deployer releases that emit V1 records wrote this owner regardless of the
/// configured value, so V1 intents must carry it to regenerate identical
/// artifacts.
pub const V1_PROTOCOL_VERSIONS_OWNER: &str = "0x79ADD5713B383DAa0a138d3C4780C7A1804a8090";

const V1_INTENT: &str = include_str!("../templates/v1/intent.toml");
const V1_STATE: &str = include_str!("../templates/v1/state.json");
const V2_INTENT: &str = include_str!("../templates/v2/intent.toml");
const V2_STATE: &str = include_str!("../templates/v2/state.json");
const V3_INTENT: &str = include_str!("../templates/v3/intent.toml");
const V3_STATE: &str = include_str!("../templates/v3/state.json");
const V4_INTENT: &str = include_str!("../templates/v4/intent.toml");
const V4_STATE: &str = include_str!("../templates/v4/state.json");

/// A synthesized or merged intent/state pair
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentConfig {
    pub intent: Tree,
    pub state: Tree,
}

impl DeploymentConfig {
    pub fn into_parts(self) -> (Tree, Tree) {
        (self.intent, self.state)
    }
}

/// Selectors of the superchain roles in an intent
struct RolePaths {
    proxy_admin_owner: &'static str,
    protocol_versions_owner: &'static str,
    guardian: &'static str,
}

const LEGACY_ROLE_PATHS: RolePaths = RolePaths {
    proxy_admin_owner: "superchainRoles.proxyAdminOwner",
    protocol_versions_owner: "superchainRoles.protocolVersionsOwner",
    guardian: "superchainRoles.guardian",
};

const V4_ROLE_PATHS: RolePaths = RolePaths {
    proxy_admin_owner: "superchainRoles.SuperchainProxyAdminOwner",
    protocol_versions_owner: "superchainRoles.ProtocolVersionsOwner",
    guardian: "superchainRoles.SuperchainGuardian",
};

fn role_paths(version: SchemaVersion) -> Option<&'static RolePaths> {
    match version {
        SchemaVersion::V1 | SchemaVersion::V2 | SchemaVersion::V3 => Some(&LEGACY_ROLE_PATHS),
        SchemaVersion::V4 => Some(&V4_ROLE_PATHS),
        SchemaVersion::Unknown => None,
    }
}

/// Selector of a contract's implementation address in a state of `version`
pub fn implementation_path(version: SchemaVersion, contract: StandardContract) -> Option<&'static str> {
    use StandardContract::*;

    let path = match version {
        SchemaVersion::V1 | SchemaVersion::V2 | SchemaVersion::V3 => match contract {
            SuperchainConfig => "superchainDeployment.superchainConfigImplAddress",
            ProtocolVersions => "superchainDeployment.protocolVersionsImplAddress",
            OpContractsManager if version == SchemaVersion::V1 => {
                "implementationsDeployment.opcmProxyAddress"
            }
            OpContractsManager => "implementationsDeployment.opcmAddress",
            DelayedWeth => "implementationsDeployment.delayedWETHImplAddress",
            OptimismPortal => "implementationsDeployment.optimismPortalImplAddress",
            PreimageOracle => "implementationsDeployment.preimageOracleSingletonAddress",
            Mips => "implementationsDeployment.mipsSingletonAddress",
            SystemConfig => "implementationsDeployment.systemConfigImplAddress",
            L1CrossDomainMessenger => "implementationsDeployment.l1CrossDomainMessengerImplAddress",
            L1Erc721Bridge => "implementationsDeployment.l1ERC721BridgeImplAddress",
            L1StandardBridge => "implementationsDeployment.l1StandardBridgeImplAddress",
            OptimismMintableErc20Factory => {
                "implementationsDeployment.optimismMintableERC20FactoryImplAddress"
            }
            DisputeGameFactory => "implementationsDeployment.disputeGameFactoryImplAddress",
        },
        SchemaVersion::V4 => match contract {
            SuperchainConfig => "superchainContracts.SuperchainConfigImpl",
            ProtocolVersions => "superchainContracts.ProtocolVersionsImpl",
            OpContractsManager => "implementationsDeployment.OpcmImpl",
            DelayedWeth => "implementationsDeployment.DelayedWethImpl",
            OptimismPortal => "implementationsDeployment.OptimismPortalImpl",
            PreimageOracle => "implementationsDeployment.PreimageOracleSingleton",
            Mips => "implementationsDeployment.MipsSingleton",
            SystemConfig => "implementationsDeployment.SystemConfigImpl",
            L1CrossDomainMessenger => "implementationsDeployment.L1CrossDomainMessengerImpl",
            L1Erc721Bridge => "implementationsDeployment.L1Erc721BridgeImpl",
            L1StandardBridge => "implementationsDeployment.L1StandardBridgeImpl",
            OptimismMintableErc20Factory => "implementationsDeployment.OptimismMintableErc20FactoryImpl",
            DisputeGameFactory => "implementationsDeployment.DisputeGameFactoryImpl",
        },
        SchemaVersion::Unknown => return None,
    };
    Some(path)
}

/// The canonical intent of a schema version, freshly parsed
///
/// # Panics
///
/// Panics if the embedded template does not parse, which indicates a
/// corrupted build rather than bad input.
pub fn standard_intent(version: SchemaVersion) -> Option<Tree> {
    let source = match version {
        SchemaVersion::V1 => V1_INTENT,
        SchemaVersion::V2 => V2_INTENT,
        SchemaVersion::V3 => V3_INTENT,
        SchemaVersion::V4 => V4_INTENT,
        SchemaVersion::Unknown => return None,
    };
    Some(tree_from_toml(source).unwrap_or_else(|err| {
        panic!("embedded {} intent template is invalid: {}", version, err)
    }))
}

/// The canonical state of a schema version, freshly parsed
///
/// # Panics
///
/// Panics if the embedded template does not parse.
pub fn standard_state(version: SchemaVersion) -> Option<Tree> {
    let source = match version {
        SchemaVersion::V1 => V1_STATE,
        SchemaVersion::V2 => V2_STATE,
        SchemaVersion::V3 => V3_STATE,
        SchemaVersion::V4 => V4_STATE,
        SchemaVersion::Unknown => return None,
    };
    Some(tree_from_json(source).unwrap_or_else(|err| {
        panic!("embedded {} state template is invalid: {}", version, err)
    }))
}

/// Normalize a 20-byte hex address to lower case
fn normalize_address(contract: &str, address: &str) -> Result<String, TemplateError> {
    let invalid = || TemplateError::InvalidAddress {
        contract: contract.to_string(),
        address: address.to_string(),
    };
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    if bytes.len() != 20 {
        return Err(invalid());
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

fn write_roles(
    intent: &mut Tree,
    version: SchemaVersion,
    roles: &RolesConfig,
) -> Result<(), TemplateError> {
    let paths = role_paths(version).ok_or(TemplateError::UnsupportedVersion(version))?;

    write_str(intent, paths.proxy_admin_owner, Value::from(roles.proxy_admin_owner.as_str()))?;
    write_str(
        intent,
        paths.protocol_versions_owner,
        Value::from(roles.protocol_versions_owner.as_str()),
    )?;
    write_str(intent, paths.guardian, Value::from(roles.guardian.as_str()))?;

    if version == SchemaVersion::V1 {
        write_str(
            intent,
            paths.protocol_versions_owner,
            Value::from(V1_PROTOCOL_VERSIONS_OWNER),
        )?;
    }
    Ok(())
}

/// Build the standard intent and state for a version, L1 network and release
///
/// # Errors
///
/// - [`TemplateError::UnsupportedVersion`] for [`SchemaVersion::Unknown`]
/// - [`TemplateError::UnsupportedChain`] if the catalog has no roles for `l1_chain_id`
/// - [`TemplateError::UnsupportedRelease`] if the network has no such release
/// - [`TemplateError::InvalidAddress`] if a catalog address is not 20-byte hex
pub fn synthesize(
    catalog: &StandardsCatalog,
    version: SchemaVersion,
    l1_chain_id: u64,
    release_tag: &str,
) -> Result<DeploymentConfig, TemplateError> {
    let mut intent = standard_intent(version).ok_or(TemplateError::UnsupportedVersion(version))?;
    let network = catalog
        .network(l1_chain_id)
        .ok_or(TemplateError::UnsupportedChain(l1_chain_id))?;

    write_str(&mut intent, "l1ChainID", Value::from(l1_chain_id))?;
    write_roles(&mut intent, version, &network.roles)?;

    let release = network
        .releases
        .get(release_tag)
        .ok_or_else(|| TemplateError::UnsupportedRelease {
            network: network.name.clone(),
            tag: release_tag.to_string(),
        })?;

    let mut state = standard_state(version).ok_or(TemplateError::UnsupportedVersion(version))?;
    for contract in StandardContract::ALL {
        let Some(address) = contract.entry(release).and_then(|entry| entry.address()) else {
            debug!(
                contract = contract.name(),
                release = release_tag,
                "no standard address configured, leaving template value"
            );
            continue;
        };
        let path = implementation_path(version, contract)
            .ok_or(TemplateError::UnsupportedVersion(version))?;
        let address = normalize_address(contract.name(), address)?;
        write_str(&mut state, path, Value::String(address))?;
    }

    debug!(
        %version,
        network = network.name.as_str(),
        release = release_tag,
        "synthesized standard template"
    );
    Ok(DeploymentConfig { intent, state })
}

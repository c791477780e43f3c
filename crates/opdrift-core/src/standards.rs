//! Standards catalog: superchain roles and standard contract implementations
//!
//! The catalog is plain data. It is built once (from the TOML documents
//! embedded in this crate, or from caller-supplied ones) and then shared by
//! reference with every synthesis and merge call. Nothing in it is mutated
//! after construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

const EMBEDDED_ROLES: &str = include_str!("../standards/roles.toml");
const EMBEDDED_VERSIONS: &str = include_str!("../standards/versions.toml");

/// L1 chain id of Ethereum mainnet
pub const MAINNET_L1_CHAIN_ID: u64 = 1;

/// L1 chain id of the Sepolia testnet
pub const SEPOLIA_L1_CHAIN_ID: u64 = 11155111;

/// Superchain roles written into every standard intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesConfig {
    pub proxy_admin_owner: String,
    pub protocol_versions_owner: String,
    pub guardian: String,
}

/// A standard contract entry for one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEntry {
    /// Semantic version of the contract
    pub version: String,
    /// Address of the standard implementation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_address: Option<String>,
    /// Address of a singleton deployment (used by the OP Contracts Manager)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContractEntry {
    /// The configured address, if any; the implementation address wins
    pub fn address(&self) -> Option<&str> {
        self.implementation_address
            .as_deref()
            .or(self.address.as_deref())
    }
}

/// Standard contract versions and addresses for one contracts release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    pub superchain_config: Option<ContractEntry>,
    pub protocol_versions: Option<ContractEntry>,
    pub op_contracts_manager: Option<ContractEntry>,
    pub delayed_weth: Option<ContractEntry>,
    pub optimism_portal: Option<ContractEntry>,
    pub preimage_oracle: Option<ContractEntry>,
    pub mips: Option<ContractEntry>,
    pub system_config: Option<ContractEntry>,
    pub l1_cross_domain_messenger: Option<ContractEntry>,
    pub l1_erc721_bridge: Option<ContractEntry>,
    pub l1_standard_bridge: Option<ContractEntry>,
    pub optimism_mintable_erc20_factory: Option<ContractEntry>,
    pub dispute_game_factory: Option<ContractEntry>,
}

/// Contracts whose standard implementation addresses are injected into state templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardContract {
    SuperchainConfig,
    ProtocolVersions,
    OpContractsManager,
    DelayedWeth,
    OptimismPortal,
    PreimageOracle,
    Mips,
    SystemConfig,
    L1CrossDomainMessenger,
    L1Erc721Bridge,
    L1StandardBridge,
    OptimismMintableErc20Factory,
    DisputeGameFactory,
}

impl StandardContract {
    pub const ALL: [StandardContract; 13] = [
        StandardContract::SuperchainConfig,
        StandardContract::ProtocolVersions,
        StandardContract::OpContractsManager,
        StandardContract::DelayedWeth,
        StandardContract::OptimismPortal,
        StandardContract::PreimageOracle,
        StandardContract::Mips,
        StandardContract::SystemConfig,
        StandardContract::L1CrossDomainMessenger,
        StandardContract::L1Erc721Bridge,
        StandardContract::L1StandardBridge,
        StandardContract::OptimismMintableErc20Factory,
        StandardContract::DisputeGameFactory,
    ];

    /// Key of the contract in the versions document
    pub fn name(self) -> &'static str {
        match self {
            StandardContract::SuperchainConfig => "superchain_config",
            StandardContract::ProtocolVersions => "protocol_versions",
            StandardContract::OpContractsManager => "op_contracts_manager",
            StandardContract::DelayedWeth => "delayed_weth",
            StandardContract::OptimismPortal => "optimism_portal",
            StandardContract::PreimageOracle => "preimage_oracle",
            StandardContract::Mips => "mips",
            StandardContract::SystemConfig => "system_config",
            StandardContract::L1CrossDomainMessenger => "l1_cross_domain_messenger",
            StandardContract::L1Erc721Bridge => "l1_erc721_bridge",
            StandardContract::L1StandardBridge => "l1_standard_bridge",
            StandardContract::OptimismMintableErc20Factory => "optimism_mintable_erc20_factory",
            StandardContract::DisputeGameFactory => "dispute_game_factory",
        }
    }

    /// Look this contract up in a release's version config
    pub fn entry(self, config: &VersionConfig) -> Option<&ContractEntry> {
        match self {
            StandardContract::SuperchainConfig => config.superchain_config.as_ref(),
            StandardContract::ProtocolVersions => config.protocol_versions.as_ref(),
            StandardContract::OpContractsManager => config.op_contracts_manager.as_ref(),
            StandardContract::DelayedWeth => config.delayed_weth.as_ref(),
            StandardContract::OptimismPortal => config.optimism_portal.as_ref(),
            StandardContract::PreimageOracle => config.preimage_oracle.as_ref(),
            StandardContract::Mips => config.mips.as_ref(),
            StandardContract::SystemConfig => config.system_config.as_ref(),
            StandardContract::L1CrossDomainMessenger => config.l1_cross_domain_messenger.as_ref(),
            StandardContract::L1Erc721Bridge => config.l1_erc721_bridge.as_ref(),
            StandardContract::L1StandardBridge => config.l1_standard_bridge.as_ref(),
            StandardContract::OptimismMintableErc20Factory => {
                config.optimism_mintable_erc20_factory.as_ref()
            }
            StandardContract::DisputeGameFactory => config.dispute_game_factory.as_ref(),
        }
    }
}

/// Roles and releases of one L1 network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStandards {
    pub name: String,
    pub l1_chain_id: u64,
    pub roles: RolesConfig,
    pub releases: BTreeMap<String, VersionConfig>,
}

#[derive(Deserialize)]
struct RolesDocument {
    networks: BTreeMap<String, NetworkRoles>,
}

#[derive(Deserialize)]
struct NetworkRoles {
    l1_chain_id: u64,
    #[serde(flatten)]
    roles: RolesConfig,
}

/// Immutable lookup tables for roles and standard implementations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardsCatalog {
    networks: BTreeMap<String, NetworkStandards>,
}

impl StandardsCatalog {
    /// The catalog compiled into this crate
    ///
    /// # Panics
    ///
    /// Panics if the embedded documents are invalid, which can only happen
    /// with a corrupted build.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_ROLES, EMBEDDED_VERSIONS)
            .unwrap_or_else(|err| panic!("embedded standards catalog is invalid: {}", err))
    }

    /// Build a catalog from a roles document and a versions document
    ///
    /// The roles document has one `[networks.<name>]` table per network with
    /// an `l1_chain_id` and the three superchain roles. The versions document
    /// has one `[<network>."<release tag>"]` table per release.
    pub fn from_toml(roles: &str, versions: &str) -> Result<Self, CatalogError> {
        let roles: RolesDocument = toml::from_str(roles).map_err(|source| CatalogError::Parse {
            document: "roles",
            source,
        })?;
        let mut versions: BTreeMap<String, BTreeMap<String, VersionConfig>> =
            toml::from_str(versions).map_err(|source| CatalogError::Parse {
                document: "versions",
                source,
            })?;

        if let Some(unknown) = versions.keys().find(|name| !roles.networks.contains_key(*name)) {
            return Err(CatalogError::UnknownNetwork(unknown.clone()));
        }

        let mut networks = BTreeMap::new();
        let mut seen_ids = std::collections::BTreeSet::new();
        for (name, network) in roles.networks {
            if !seen_ids.insert(network.l1_chain_id) {
                return Err(CatalogError::DuplicateChainId(network.l1_chain_id));
            }
            let releases = versions.remove(&name).unwrap_or_default();
            networks.insert(
                name.clone(),
                NetworkStandards {
                    name,
                    l1_chain_id: network.l1_chain_id,
                    roles: network.roles,
                    releases,
                },
            );
        }

        Ok(Self { networks })
    }

    /// Network standards for an L1 chain id
    pub fn network(&self, l1_chain_id: u64) -> Option<&NetworkStandards> {
        self.networks
            .values()
            .find(|network| network.l1_chain_id == l1_chain_id)
    }

    /// Network standards by name (`mainnet`, `sepolia`, ...)
    pub fn network_by_name(&self, name: &str) -> Option<&NetworkStandards> {
        self.networks.get(name)
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkStandards> {
        self.networks.values()
    }

    /// Superchain roles for an L1 chain id
    pub fn roles(&self, l1_chain_id: u64) -> Option<&RolesConfig> {
        self.network(l1_chain_id).map(|network| &network.roles)
    }

    /// Standard versions of a release on the network of an L1 chain id
    pub fn release(&self, l1_chain_id: u64, tag: &str) -> Option<&VersionConfig> {
        self.network(l1_chain_id)
            .and_then(|network| network.releases.get(tag))
    }
}

impl Default for StandardsCatalog {
    fn default() -> Self {
        Self::embedded()
    }
}

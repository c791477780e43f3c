//! Input loading and output formatting utilities
//!
//! This module reads configuration files into trees, loads the standards
//! catalog and writes merged or synthesized configurations to disk.

use anyhow::{Context, Result};
use opdrift_core::tree::{tree_from_json, tree_from_toml, tree_to_json, tree_to_toml};
use opdrift_core::{DeploymentConfig, StandardsCatalog, Tree};
use std::path::Path;
use tracing::debug;

/// File name of the intent inside an output directory
pub const INTENT_FILE: &str = "intent.toml";

/// File name of the state inside an output directory
pub const STATE_FILE: &str = "state.json";

const ROLES_FILE: &str = "roles.toml";
const VERSIONS_FILE: &str = "versions.toml";

/// Helper function to load a tree from a file
///
/// Files with a `.toml` extension are parsed as TOML, everything else as JSON.
pub fn load_tree(path: &Path) -> Result<Tree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let tree = if is_toml {
        tree_from_toml(&content).with_context(|| format!("failed to parse {} as TOML", path.display()))?
    } else {
        tree_from_json(&content).with_context(|| format!("failed to parse {} as JSON", path.display()))?
    };
    Ok(tree)
}

/// Helper function to load the standards catalog
///
/// Without a directory the catalog built into the binary is used.
pub fn load_catalog(standards_dir: Option<&Path>) -> Result<StandardsCatalog> {
    let Some(dir) = standards_dir else {
        return Ok(StandardsCatalog::embedded());
    };

    debug!("Loading standards from {}", dir.display());
    let read = |name: &str| {
        let path = dir.join(name);
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    };
    let roles = read(ROLES_FILE)?;
    let versions = read(VERSIONS_FILE)?;

    StandardsCatalog::from_toml(&roles, &versions)
        .with_context(|| format!("invalid standards in {}", dir.display()))
}

/// Helper function to write an intent/state pair into a directory
pub fn write_config(config: &DeploymentConfig, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let intent = tree_to_toml(&config.intent).context("failed to serialize intent as TOML")?;
    let state = tree_to_json(&config.state).context("failed to serialize state as JSON")?;

    let intent_path = output_dir.join(INTENT_FILE);
    std::fs::write(&intent_path, intent)
        .with_context(|| format!("failed to write {}", intent_path.display()))?;
    let state_path = output_dir.join(STATE_FILE);
    std::fs::write(&state_path, state + "\n")
        .with_context(|| format!("failed to write {}", state_path.display()))?;

    Ok(())
}

/// Format diff entries for display
pub fn format_diff(entries: &[String], json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(entries).map_err(Into::into);
    }
    Ok(entries.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_tree_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("intent.toml");
        std::fs::write(&toml_path, "l1ChainID = 1\n[superchainRoles]\nguardian = \"0x01\"\n").unwrap();
        let tree = load_tree(&toml_path).unwrap();
        assert_eq!(tree["superchainRoles"]["guardian"], json!("0x01"));

        let json_path = dir.path().join("state.txt");
        std::fs::write(&json_path, r#"{"l1StateDump": null}"#).unwrap();
        let tree = load_tree(&json_path).unwrap();
        assert_eq!(tree["l1StateDump"], json!(null));
    }

    #[test]
    fn test_load_tree_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = load_tree(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_load_catalog_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(ROLES_FILE),
            r#"
[networks.devnet]
l1_chain_id = 900
proxy_admin_owner = "0x0000000000000000000000000000000000000001"
protocol_versions_owner = "0x0000000000000000000000000000000000000002"
guardian = "0x0000000000000000000000000000000000000003"
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(VERSIONS_FILE), "").unwrap();

        let catalog = load_catalog(Some(dir.path())).unwrap();
        assert!(catalog.network(900).is_some());
        assert!(catalog.network(1).is_none());
    }

    #[test]
    fn test_write_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeploymentConfig {
            intent: json!({"l1ChainID": 1, "chains": [{"id": "0x01"}]})
                .as_object()
                .cloned()
                .unwrap(),
            state: json!({"l1StateDump": null}).as_object().cloned().unwrap(),
        };

        write_config(&config, dir.path()).unwrap();
        assert_eq!(load_tree(&dir.path().join(INTENT_FILE)).unwrap(), config.intent);
        assert_eq!(load_tree(&dir.path().join(STATE_FILE)).unwrap(), config.state);
    }
}

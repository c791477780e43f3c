//! CLI integration tests for all subcommands.
//!
//! Uses `assert_cmd` to spawn the `opdrift` binary and verify exit codes,
//! stdout content and the files it writes.

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of a deployment record fixture shared with opdrift-core
fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../opdrift-core/tests/data")
        .join(name)
}

fn opdrift() -> Command {
    let mut cmd = Command::cargo_bin("opdrift").unwrap();
    cmd.env_remove("OPDRIFT_STANDARDS_DIR");
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn help_lists_commands() {
    opdrift()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge-all"))
        .stdout(predicate::str::contains("detect-binary"));
}

#[test]
fn detect_prints_version() {
    opdrift()
        .arg("detect")
        .arg(fixture("v1_record.json"))
        .assert()
        .success()
        .stdout("v1\n");
}

#[test]
fn detect_json_format() {
    let output = opdrift()
        .args(["--format", "json", "detect"])
        .arg(fixture("v4_record.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["version"], Value::from("v4"));
}

#[test]
fn detect_unknown_exits_1() {
    let dir = TempDir::new().unwrap();
    let record = dir.path().join("record.json");
    fs::write(
        &record,
        r#"{"appliedIntent": {"l1ContractsLocator": "tool/v99.0.0"}}"#,
    )
    .unwrap();

    opdrift()
        .arg("detect")
        .arg(&record)
        .assert()
        .code(1)
        .stdout("unknown\n");
}

#[test]
fn detect_binary_buckets_minor() {
    opdrift()
        .args(["detect-binary", "op-deployer/v0.3.1"])
        .assert()
        .success()
        .stdout("v3\n");

    opdrift()
        .args(["detect-binary", "op-deployer/v0.9.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported binary version"));
}

#[test]
fn synthesize_writes_both_files() {
    let dir = TempDir::new().unwrap();
    opdrift()
        .args([
            "synthesize",
            "--version",
            "v1",
            "--l1-chain-id",
            "1",
            "--release",
            "op-contracts/v1.6.0",
            "-o",
        ])
        .arg(dir.path())
        .assert()
        .success();

    let intent = fs::read_to_string(dir.path().join("intent.toml")).unwrap();
    assert!(intent.contains("0x79ADD5713B383DAa0a138d3C4780C7A1804a8090"));
    let state = read_json(&dir.path().join("state.json"));
    assert_eq!(state["l1StateDump"], Value::Null);
}

#[test]
fn synthesize_unsupported_chain_fails() {
    let dir = TempDir::new().unwrap();
    opdrift()
        .args([
            "synthesize",
            "--version",
            "v2",
            "--l1-chain-id",
            "10",
            "--release",
            "op-contracts/v1.8.0",
            "-o",
        ])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported L1 chain id 10"));
}

#[test]
fn merge_then_diff_against_itself_is_clean() {
    let dir = TempDir::new().unwrap();
    opdrift()
        .arg("merge")
        .arg(fixture("v4_record.json"))
        .arg("-o")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(v4)"));

    let state = dir.path().join("state.json");
    assert_eq!(
        read_json(&state)["opChainDeployments"][0]["StartBlock"]["number"],
        Value::from("0x1234")
    );

    opdrift()
        .arg("diff")
        .arg(&state)
        .arg(&state)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn merge_reports_every_missing_field() {
    let dir = TempDir::new().unwrap();
    let mut record = read_json(&fixture("v1_record.json"));
    let map = record.as_object_mut().unwrap();
    map.remove("create2Salt");
    map.remove("superchainDeployment");
    let path = dir.path().join("broken.json");
    fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

    opdrift()
        .arg("merge")
        .arg(&path)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("4 fields failed to merge"))
        .stderr(predicate::str::contains("create2Salt"))
        .stderr(predicate::str::contains("superchainDeployment.protocolVersionsProxyAddress"));
}

#[test]
fn merge_rejects_null_intent_field() {
    let dir = TempDir::new().unwrap();
    let mut record = read_json(&fixture("v4_record.json"));
    record["appliedIntent"]["chains"][0]["roles"]["batcher"] = Value::Null;
    let path = dir.path().join("null_batcher.json");
    fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();
    let out = dir.path().join("out");

    opdrift()
        .arg("merge")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("appliedIntent.chains.[0].roles.batcher"));

    assert!(!out.join("intent.toml").exists());
}

#[test]
fn merge_all_writes_one_directory_per_record() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{}").unwrap();

    opdrift()
        .arg("merge-all")
        .arg(fixture("v1_record.json"))
        .arg(fixture("v4_record.json"))
        .arg(&bad)
        .arg("-o")
        .arg(&out)
        .args(["--jobs", "2"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Merged 2 of 3 records"))
        .stderr(predicate::str::contains("bad.json"));

    assert!(out.join("v1_record").join("intent.toml").exists());
    assert!(out.join("v4_record").join("state.json").exists());
    assert!(!out.join("bad").exists());
}

#[test]
fn diff_reports_sorted_entries_and_exits_1() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.toml");
    fs::write(&a, r#"{"array": [1, 2, 3], "k": {"a": 1, "b": 2.0}}"#).unwrap();
    fs::write(&b, "array = [1, 2]\n[k]\na = 9\nb = 2\n").unwrap();

    opdrift()
        .arg("diff")
        .arg(&a)
        .arg(&b)
        .args(["--prefix", "p"])
        .assert()
        .code(1)
        .stdout("p.array: array length mismatch (3 vs 2)\np.k.a: value mismatch (1 vs 9)\n");
}

#[test]
fn standards_dir_overrides_catalog() {
    let dir = TempDir::new().unwrap();
    let standards = dir.path().join("standards");
    fs::create_dir_all(&standards).unwrap();
    fs::write(
        standards.join("roles.toml"),
        r#"
[networks.devnet]
l1_chain_id = 900
proxy_admin_owner = "0x0000000000000000000000000000000000000001"
protocol_versions_owner = "0x0000000000000000000000000000000000000002"
guardian = "0x0000000000000000000000000000000000000003"
"#,
    )
    .unwrap();
    fs::write(
        standards.join("versions.toml"),
        r#"
[devnet."op-contracts/v2.0.0".system_config]
version = "2.3.0"
implementation_address = "0x00000000000000000000000000000000000000AB"
"#,
    )
    .unwrap();

    let out = dir.path().join("out");
    opdrift()
        .env("OPDRIFT_STANDARDS_DIR", &standards)
        .args([
            "synthesize",
            "--version",
            "v3",
            "--l1-chain-id",
            "900",
            "--release",
            "op-contracts/v2.0.0",
            "-o",
        ])
        .arg(&out)
        .assert()
        .success();

    let state = read_json(&out.join("state.json"));
    assert_eq!(
        state["implementationsDeployment"]["systemConfigImplAddress"],
        Value::from("0x00000000000000000000000000000000000000ab")
    );
}

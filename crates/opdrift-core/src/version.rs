//! Schema version detection
//!
//! Deployment records produced by different op-deployer releases come in four
//! incompatible shapes. The shape is inferred either from the contracts
//! locator recorded in the applied intent, or from the deployer binary
//! version string.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::VersionError;
use crate::selector::read_str;
use crate::tree::Tree;

/// Selector of the locator string used for detection
pub const LOCATOR_SELECTOR: &str = "appliedIntent.l1ContractsLocator";

/// Prefix of contract release locators
pub const LOCATOR_TAG_PREFIX: &str = "tag://";

/// Known historical shapes of deployment records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
    V3,
    V4,
    Unknown,
}

impl SchemaVersion {
    /// Every supported version, oldest first
    pub const KNOWN: [SchemaVersion; 4] = [
        SchemaVersion::V1,
        SchemaVersion::V2,
        SchemaVersion::V3,
        SchemaVersion::V4,
    ];

    pub fn is_known(self) -> bool {
        self != SchemaVersion::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
            SchemaVersion::V3 => "v3",
            SchemaVersion::V4 => "v4",
            SchemaVersion::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(SchemaVersion::V1),
            "v2" => Ok(SchemaVersion::V2),
            "v3" => Ok(SchemaVersion::V3),
            "v4" => Ok(SchemaVersion::V4),
            "unknown" => Ok(SchemaVersion::Unknown),
            other => Err(format!("unknown schema version '{}'", other)),
        }
    }
}

/// Locators that identify each schema version, matched exactly
const LOCATOR_TABLE: &[(&str, SchemaVersion)] = &[
    ("tag://op-contracts/v1.6.0", SchemaVersion::V1),
    ("tag://op-contracts/v1.8.0", SchemaVersion::V2),
    ("tag://op-contracts/v2.0.0", SchemaVersion::V3),
    ("tag://op-contracts/v3.0.0", SchemaVersion::V4),
];

fn rc_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-rc\.\d+$").expect("static regex"))
}

fn binary_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.-]+/v(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:[-+].*)?$")
            .expect("static regex")
    })
}

/// Strip a trailing `-rc.N` pre-release marker from a locator or tag
pub fn strip_rc_suffix(locator: &str) -> &str {
    match rc_suffix().find(locator) {
        Some(m) => &locator[..m.start()],
        None => locator,
    }
}

/// Release tag named by a locator, e.g. `op-contracts/v1.6.0`
///
/// The `tag://` prefix and any `-rc.N` suffix are removed. Returns `None` for
/// locators that do not name a tagged release.
pub fn release_tag(locator: &str) -> Option<&str> {
    locator
        .strip_prefix(LOCATOR_TAG_PREFIX)
        .map(strip_rc_suffix)
        .filter(|tag| !tag.is_empty())
}

/// Classify a locator string
pub fn version_for_locator(locator: &str) -> SchemaVersion {
    let normalized = strip_rc_suffix(locator);
    LOCATOR_TABLE
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, version)| *version)
        .unwrap_or(SchemaVersion::Unknown)
}

/// Detect the schema version of a deployment record
///
/// Reads `appliedIntent.l1ContractsLocator`. A missing or non-string locator,
/// or one that matches no known release, yields [`SchemaVersion::Unknown`],
/// which callers must treat as an error.
pub fn detect_schema_version(record: &Tree) -> SchemaVersion {
    let version = match read_str(record, LOCATOR_SELECTOR) {
        Ok(Value::String(locator)) => version_for_locator(&locator),
        _ => SchemaVersion::Unknown,
    };
    debug!(%version, "detected schema version from locator");
    version
}

/// Detect the schema version from a deployer binary version string
///
/// Accepts `tool/vMAJOR.MINOR.PATCH` with an optional pre-release or build
/// suffix and buckets on MINOR: 0 and 1 are V1, 2 is V2, 3 is V3, 4 is V4.
///
/// # Examples
///
/// ```rust
/// use opdrift_core::{detect_from_binary_version, SchemaVersion};
///
/// assert_eq!(detect_from_binary_version("op-deployer/v0.2.0").unwrap(), SchemaVersion::V2);
/// assert!(detect_from_binary_version("op-deployer/v0.9.0").is_err());
/// ```
pub fn detect_from_binary_version(version: &str) -> Result<SchemaVersion, VersionError> {
    let captures = binary_version()
        .captures(version.trim())
        .ok_or_else(|| VersionError::Malformed(version.to_string()))?;
    let minor: u64 = captures["minor"]
        .parse()
        .map_err(|_| VersionError::Malformed(version.to_string()))?;

    let schema = match minor {
        0 | 1 => SchemaVersion::V1,
        2 => SchemaVersion::V2,
        3 => SchemaVersion::V3,
        4 => SchemaVersion::V4,
        _ => return Err(VersionError::UnsupportedVersion(version.to_string())),
    };
    debug!(binary = version, %schema, "detected schema version from binary");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(locator: Value) -> Tree {
        match json!({"appliedIntent": {"l1ContractsLocator": locator}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_detect_known_locators() {
        let cases = [
            ("tag://op-contracts/v1.6.0", SchemaVersion::V1),
            ("tag://op-contracts/v1.8.0", SchemaVersion::V2),
            ("tag://op-contracts/v2.0.0", SchemaVersion::V3),
            ("tag://op-contracts/v3.0.0", SchemaVersion::V4),
        ];
        for (locator, expected) in cases {
            assert_eq!(detect_schema_version(&record(json!(locator))), expected, "{}", locator);
        }
    }

    #[test]
    fn test_detect_strips_rc_suffix() {
        assert_eq!(
            detect_schema_version(&record(json!("tag://op-contracts/v1.8.0-rc.4"))),
            SchemaVersion::V2
        );
        assert_eq!(
            detect_schema_version(&record(json!("tag://op-contracts/v3.0.0-rc.12"))),
            SchemaVersion::V4
        );
        // Only a trailing rc marker is stripped.
        assert_eq!(
            detect_schema_version(&record(json!("tag://op-contracts/v1.6.0-beta.1"))),
            SchemaVersion::Unknown
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(
            detect_schema_version(&record(json!("tool/v99.0.0"))),
            SchemaVersion::Unknown
        );
        assert_eq!(detect_schema_version(&record(json!(42))), SchemaVersion::Unknown);
        assert_eq!(detect_schema_version(&Tree::new()), SchemaVersion::Unknown);
    }

    #[test]
    fn test_release_tag() {
        assert_eq!(release_tag("tag://op-contracts/v1.6.0"), Some("op-contracts/v1.6.0"));
        assert_eq!(release_tag("tag://op-contracts/v1.8.0-rc.4"), Some("op-contracts/v1.8.0"));
        assert_eq!(release_tag("file:///tmp/artifacts"), None);
        assert_eq!(release_tag("tag://"), None);
    }

    #[test]
    fn test_binary_version_buckets() {
        let cases = [
            ("op-deployer/v0.0.11", SchemaVersion::V1),
            ("op-deployer/v0.1.0", SchemaVersion::V1),
            ("op-deployer/v0.2.3", SchemaVersion::V2),
            ("op-deployer/v0.3.0-rc.1", SchemaVersion::V3),
            ("op-deployer/v1.4.0+dev", SchemaVersion::V4),
        ];
        for (binary, expected) in cases {
            assert_eq!(detect_from_binary_version(binary).unwrap(), expected, "{}", binary);
        }
    }

    #[test]
    fn test_binary_version_errors() {
        assert_eq!(
            detect_from_binary_version("op-deployer/v0.5.0"),
            Err(VersionError::UnsupportedVersion("op-deployer/v0.5.0".into()))
        );
        assert!(matches!(
            detect_from_binary_version("v0.2.0"),
            Err(VersionError::Malformed(_))
        ));
        assert!(matches!(
            detect_from_binary_version("op-deployer/0.2.0"),
            Err(VersionError::Malformed(_))
        ));
    }

    #[test]
    fn test_version_parse_display() {
        for version in SchemaVersion::KNOWN {
            assert_eq!(version.to_string().parse::<SchemaVersion>().unwrap(), version);
        }
        assert_eq!("V4".parse::<SchemaVersion>().unwrap(), SchemaVersion::V4);
        assert!("v5".parse::<SchemaVersion>().is_err());
    }
}

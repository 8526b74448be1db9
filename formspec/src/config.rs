//! Engine configuration.
//!
//! Stored as TOML, typically in `.formspec.toml`:
//!
//! ```toml
//! max_recomposition_depth = 8
//! unknown_keys = "drop"
//! transit_key = "00112233445566778899aabbccddeeff"
//! ```

use std::{fs, path::Path};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What a dictionary does with keys its schema does not declare.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeyPolicy {
    /// Drop the key and log a warning.
    #[default]
    Drop,
    /// Treat the whole dictionary as unparseable.
    Reject,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of chained recompositions `resolve` follows.
    pub max_recomposition_depth: usize,
    /// Handling of undeclared dictionary keys.
    pub unknown_keys: UnknownKeyPolicy,
    /// Hex key for the transit password cipher. Random per process when unset.
    pub transit_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recomposition_depth: 8,
            unknown_keys: UnknownKeyPolicy::Drop,
            transit_key: None,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(s)?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!("{} not found, using default engine config", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_parse() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_recomposition_depth = 3
            unknown_keys = "reject"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_recomposition_depth, 3);
        assert_eq!(config.unknown_keys, UnknownKeyPolicy::Reject);
        assert!(config.transit_key.is_none());
    }

    #[test]
    fn test_unknown_field_value_rejected() {
        assert!(EngineConfig::from_toml_str("unknown_keys = \"explode\"").is_err());
    }
}

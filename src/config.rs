//! Configuration handling for wg-split

use crate::netlist::DEFAULT_LIST_URL;
use crate::policy::{Block, DEFAULT_BLOCK_CAP, DEFAULT_FLOOR_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub list: ListConfig,
    pub policy: PolicyConfig,
    pub templates: Vec<TemplatePair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Where to fetch the bypass list when no local file is given.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum number of routes the client route table should receive.
    /// Must be at least 1.
    pub route_budget: usize,
    /// Aggregation never widens blocks past this prefix length (0..=32).
    pub floor_prefix: u8,
    /// Safety cap on intermediate block count during exclusion.
    pub block_cap: usize,
    /// VPN-internal subnets that must always be routed.
    pub mandatory: Vec<Block>,
}

/// A config template and the patched output written next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePair {
    pub source: String,
    pub output: String,
    pub label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list: ListConfig {
                url: DEFAULT_LIST_URL.to_string(),
            },
            policy: PolicyConfig {
                route_budget: 4000,
                floor_prefix: DEFAULT_FLOOR_PREFIX,
                block_cap: DEFAULT_BLOCK_CAP,
                mandatory: vec!["10.8.0.0/24".parse().expect("valid default subnet")],
            },
            templates: vec![
                TemplatePair {
                    source: "client.conf".to_string(),
                    output: "client-split.conf".to_string(),
                    label: "client-split".to_string(),
                },
                TemplatePair {
                    source: "phone.conf".to_string(),
                    output: "phone-split.conf".to_string(),
                    label: "phone-split".to_string(),
                },
            ],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.floor_prefix > 32 {
            return Err(ConfigError::InvalidValue(format!(
                "floor_prefix /{} out of range 0..=32",
                self.policy.floor_prefix
            )));
        }
        if self.policy.route_budget == 0 {
            return Err(ConfigError::InvalidValue(
                "route_budget must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).expect("Failed to serialize config");
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.policy.route_budget, 4000);
        assert_eq!(config.policy.floor_prefix, 17);
        assert_eq!(config.policy.mandatory.len(), 1);
        assert_eq!(config.templates.len(), 2);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wg-split.toml");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.list.url, config.list.url);
        assert_eq!(loaded.policy.route_budget, config.policy.route_budget);
        assert_eq!(loaded.policy.mandatory, config.policy.mandatory);
        assert_eq!(loaded.templates.len(), config.templates.len());
    }

    #[test]
    fn test_load_parses_mandatory_blocks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wg-split.toml");
        std::fs::write(
            &path,
            r#"
[list]
url = "https://example.com/list.txt"

[policy]
route_budget = 100
floor_prefix = 20
block_cap = 500000
mandatory = ["10.8.0.0/24", "10.9.0.0/24"]

[[templates]]
source = "wg0.conf"
output = "wg0-split.conf"
label = "wg0"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.policy.mandatory.len(), 2);
        assert_eq!(config.policy.mandatory[1], "10.9.0.0/24".parse().unwrap());
        assert_eq!(config.templates[0].label, "wg0");
    }

    #[test]
    fn test_load_rejects_unaligned_mandatory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wg-split.toml");
        std::fs::write(
            &path,
            r#"
templates = []

[list]
url = "https://example.com/list.txt"

[policy]
route_budget = 100
floor_prefix = 20
block_cap = 500000
mandatory = ["10.8.0.1/24"]
"#,
        )
        .unwrap();

        // Mandatory subnets are engine input: strict validation applies
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    fn write_config(dir: &TempDir, floor_prefix: u8, route_budget: usize) -> std::path::PathBuf {
        let path = dir.path().join("wg-split.toml");
        std::fs::write(
            &path,
            format!(
                r#"
templates = []

[list]
url = "https://example.com/list.txt"

[policy]
route_budget = {route_budget}
floor_prefix = {floor_prefix}
block_cap = 500000
mandatory = []
"#
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_load_rejects_floor_prefix_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, 40, 4000);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("floor_prefix"));
    }

    #[test]
    fn test_load_rejects_zero_route_budget() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, 17, 0);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("route_budget"));
    }

    #[test]
    fn test_load_accepts_boundary_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, 32, 1);
        assert!(Config::load(&path).is_ok());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.toml");
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.policy.route_budget, 4000);
    }
}

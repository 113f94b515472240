//! Configuration loading

use anyhow::Result;
use devcompat_core::{Capability, SupportRangeEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Firmware ranges gating capability groups
    #[serde(default, rename = "support_range")]
    pub support_ranges: Vec<SupportRangeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the asset catalog (TOML or JSON)
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> String {
    "./catalog.toml".to_string()
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(
            path = %path.display(),
            support_ranges = config.support_ranges.len(),
            "Loaded configuration"
        );
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save an example configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        catalog: CatalogConfig::default(),
        support_ranges: vec![
            SupportRangeEntry {
                capabilities: vec![Capability::Cardano],
                min: Some(vec!["0".to_string(), "2.3.2".to_string()]),
                max: None,
            },
            SupportRangeEntry {
                capabilities: vec![Capability::Eos],
                min: Some(vec!["0".to_string(), "2.1.1".to_string()]),
                max: None,
            },
        ],
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.catalog.path, "./catalog.toml");
        assert!(config.support_ranges.is_empty());
    }

    #[test]
    fn test_parse_support_ranges() {
        let toml = r#"
[catalog]
path = "coins.json"

[[support_range]]
capabilities = ["Capability_Cardano", "Capability_Monero"]
min = ["0", "2.3.2"]

[[support_range]]
capabilities = ["Capability_Ethereum"]
max = ["1.12.0", "2.6.0"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.path, "coins.json");
        assert_eq!(config.support_ranges.len(), 2);
        assert_eq!(config.support_ranges[0].min_for(2), Some("2.3.2"));
        assert_eq!(config.support_ranges[1].max_for(1), Some("1.12.0"));
        assert_eq!(config.support_ranges[1].min, None);
    }

    #[test]
    fn test_default_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devcompat.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.support_ranges.len(), 2);
        assert_eq!(config.support_ranges[0].capabilities, vec![Capability::Cardano]);
    }
}

//! Configuration for drift tracking tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (drifter.toml)
//! - Environment variables (DRIFTER_*)
//!
//! ## Example config file (drifter.toml):
//! ```toml
//! [storage]
//! root = ".drifter"
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for drift tracking
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrifterConfig {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one history artifact per source id
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// JSON output format for reports
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".drifter")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: default_storage_root() }
    }
}

impl DrifterConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["drifter.toml", ".drifter.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "drifter", "drifter") {
            let xdg_config = config_dir.config_dir().join("drifter.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("DRIFTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the storage root (resolves relative paths)
    pub fn storage_root(&self) -> PathBuf {
        if self.storage.root.is_absolute() {
            self.storage.root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.storage.root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DrifterConfig::default();
        assert_eq!(config.storage.root, PathBuf::from(".drifter"));
        assert_eq!(config.output.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_serialize_config() {
        let config = DrifterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_storage_root_resolution() {
        let mut config = DrifterConfig::default();
        config.storage.root = PathBuf::from("/var/lib/drifter");
        assert_eq!(config.storage_root(), PathBuf::from("/var/lib/drifter"));
    }
}

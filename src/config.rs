//! Configuration for cast defaults
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (hashcast.toml)
//! - Environment variables (HASHCAST__*)
//!
//! ## Example config file (hashcast.toml):
//! ```toml
//! [cast]
//! input_keys = "string"
//! output_keys = "symbol"
//! skip_unexpected_attributes = false
//!
//! [limits]
//! max_depth = 32
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_MAX_DEPTH;
use crate::value::KeyMode;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashCastConfig {
    /// Default cast options
    #[serde(default)]
    pub cast: CastDefaults,

    /// Safety limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Defaults applied to casts that don't set options explicitly.
///
/// `input_keys` is ignored by the CLI, which always reads JSON string keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastDefaults {
    #[serde(default)]
    pub input_keys: KeyMode,

    #[serde(default)]
    pub output_keys: KeyMode,

    #[serde(default)]
    pub skip_unexpected_attributes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Deepest nested hash a cast will descend into
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

static GLOBAL: Lazy<RwLock<HashCastConfig>> = Lazy::new(|| RwLock::new(HashCastConfig::default()));

/// Current process-wide configuration
pub fn global() -> HashCastConfig {
    GLOBAL.read().clone()
}

/// Replace the process-wide configuration; intended for startup
pub fn set_global(config: HashCastConfig) {
    tracing::debug!(?config, "updated global configuration");
    *GLOBAL.write() = config;
}

impl HashCastConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["hashcast.toml", ".hashcast.toml", "config/hashcast.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "hashcast", "hashcast") {
            let xdg_config = config_dir.config_dir().join("hashcast.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // HASHCAST__CAST__INPUT_KEYS=string
        builder = builder.add_source(
            Environment::with_prefix("HASHCAST")
                .prefix_separator("__")
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HashCastConfig::default();
        assert_eq!(config.cast.input_keys, KeyMode::Symbol);
        assert_eq!(config.cast.output_keys, KeyMode::Symbol);
        assert!(!config.cast.skip_unexpected_attributes);
        assert_eq!(config.limits.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_serialize_config() {
        let config = HashCastConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[cast]"));
        assert!(toml_str.contains("[limits]"));
        assert!(toml_str.contains("input_keys = \"symbol\""));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cast]\ninput_keys = \"string\"\n\n[limits]\nmax_depth = 8").unwrap();

        let config = HashCastConfig::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.cast.input_keys, KeyMode::String);
        assert_eq!(config.cast.output_keys, KeyMode::Symbol);
        assert_eq!(config.limits.max_depth, 8);
    }

    #[test]
    fn test_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashcast.toml");
        let mut config = HashCastConfig::default();
        config.cast.skip_unexpected_attributes = true;

        config.save(path.to_str().unwrap()).unwrap();
        let loaded = HashCastConfig::load_from(path.to_str()).unwrap();
        assert!(loaded.cast.skip_unexpected_attributes);
    }
}

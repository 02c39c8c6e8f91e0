//! Global Configuration (~/.extsql/config.toml)
//!
//! Handles user-level defaults stored in `~/.extsql/config.toml`.

use crate::suite::validate_extension;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.extsql/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings applied beneath every suite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Interpreter used when a suite names none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,

    /// Per-run timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Concurrent interpreter runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Reference output extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_ext: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let Some(defaults) = &self.defaults else {
            return Ok(());
        };

        if defaults.timeout_secs == Some(0) {
            return Err(ConfigError::invalid_value(
                "defaults.timeout_secs",
                "timeout must be at least one second",
            ));
        }
        if defaults.jobs == Some(0) {
            return Err(ConfigError::invalid_value(
                "defaults.jobs",
                "jobs must be at least 1",
            ));
        }
        if let Some(ext) = &defaults.reference_ext {
            validate_extension("defaults.reference_ext", ext)?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.extsql/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".extsql").join("config.toml"))
    }

    pub fn interpreter(&self) -> Option<&Path> {
        self.defaults.as_ref()?.interpreter.as_deref()
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.defaults.as_ref()?.timeout_secs
    }

    pub fn jobs(&self) -> Option<usize> {
        self.defaults.as_ref()?.jobs
    }

    pub fn reference_ext(&self) -> Option<&str> {
        self.defaults.as_ref()?.reference_ext.as_deref()
    }
}

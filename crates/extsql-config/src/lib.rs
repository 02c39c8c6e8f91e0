//! extsql Configuration System
//!
//! Provides configuration management for harness runs including:
//! - Suite configuration (harness.toml)
//! - Global user configuration (~/.extsql/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults (the external-SQL family table)
//! 2. Global config (~/.extsql/config.toml)
//! 3. Suite config (./harness.toml)
//! 4. Environment variables (EXTSQL_*)
//! 5. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use extsql_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let settings = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("{} families", settings.families.len());
//! ```

pub mod global;
pub mod loader;
pub mod settings;
pub mod suite;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid family declaration: {0}")]
    InvalidFamily(#[from] extsql_harness::HarnessError),

    #[error("Home directory not found")]
    HomeNotFound,
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Name of the suite configuration file
pub const SUITE_FILE_NAME: &str = "harness.toml";

// Re-export main types
pub use global::GlobalConfig;
pub use loader::ConfigLoader;
pub use settings::Settings;
pub use suite::SuiteConfig;

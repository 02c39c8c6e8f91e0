//! CLI configuration via environment variables
//!
//! Output preferences come from the environment; run settings come from
//! harness.toml through `extsql_config`.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON report output (EXTSQL_JSON=1)
    pub default_json: bool,
    /// Disable colored output (EXTSQL_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("EXTSQL_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: env::var("EXTSQL_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "json"
    )
}

//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::settings::Settings;
use crate::suite::SuiteConfig;
use crate::{ConfigError, ConfigResult, SUITE_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the interpreter
pub const ENV_INTERPRETER: &str = "EXTSQL_INTERPRETER";
/// Environment variable overriding the script directory
pub const ENV_SCRIPT_DIR: &str = "EXTSQL_SCRIPT_DIR";
/// Environment variable overriding the per-run timeout (seconds)
pub const ENV_TIMEOUT_SECS: &str = "EXTSQL_TIMEOUT_SECS";
/// Environment variable overriding the worker count
pub const ENV_JOBS: &str = "EXTSQL_JOBS";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Global config (~/.extsql/config.toml)
/// 3. Suite config (./harness.toml) - overrides global
/// 4. Environment variables (EXTSQL_*) - overrides suite
/// 5. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global defaults from `path` instead of ~/.extsql/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load settings starting from the given directory
    ///
    /// Walks up the directory tree to find harness.toml. Without one, the
    /// built-in family table and defaults rooted at `start_dir` apply.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Settings> {
        let global = self.load_global_config()?;
        let settings = Settings::defaults(start_dir).merge_global(&global);

        let settings = match Self::find_suite_config(start_dir) {
            Some(path) => {
                let suite = SuiteConfig::load_from_file(&path)?;
                settings.merge_suite(suite, &path)
            }
            None => settings,
        };

        apply_env_overrides(settings, |key| env::var(key).ok())
    }

    /// Load settings from a specific suite config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Settings> {
        let suite = SuiteConfig::load_from_file(config_path)?;
        let global = self.load_global_config()?;
        let root = config_path.parent().unwrap_or_else(|| Path::new("."));

        let settings = Settings::defaults(root)
            .merge_global(&global)
            .merge_suite(suite, config_path);

        apply_env_overrides(settings, |key| env::var(key).ok())
    }

    /// Find harness.toml by walking up the directory tree
    pub fn find_suite_config(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(SUITE_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Load global configuration, defaulting when the file is absent
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match GlobalConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                // No home directory means no global config
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply EXTSQL_* overrides using `lookup` to read variables
///
/// Empty values are ignored; unparsable numbers are an error.
pub fn apply_env_overrides(
    mut settings: Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<Settings> {
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(interpreter) = lookup(ENV_INTERPRETER) {
        settings.interpreter = Some(PathBuf::from(interpreter));
    }

    if let Some(dir) = lookup(ENV_SCRIPT_DIR) {
        settings.script_dir = PathBuf::from(dir);
    }

    if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
        let secs: u64 = secs.trim().parse().map_err(|_| {
            ConfigError::invalid_value(ENV_TIMEOUT_SECS, format!("'{}' is not a number", secs))
        })?;
        settings.timeout = Duration::from_secs(secs);
    }

    if let Some(jobs) = lookup(ENV_JOBS) {
        let jobs: usize = jobs.trim().parse().map_err(|_| {
            ConfigError::invalid_value(ENV_JOBS, format!("'{}' is not a number", jobs))
        })?;
        settings.jobs = Some(jobs);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_find_suite_config_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("test/api/cli");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join("harness.toml"), "").unwrap();

        assert_eq!(
            ConfigLoader::find_suite_config(&nested),
            Some(temp_dir.path().join("harness.toml"))
        );
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::defaults(Path::new("/repo"));
        let settings = apply_env_overrides(
            settings,
            lookup_from(&[
                (ENV_INTERPRETER, "/opt/daphne"),
                (ENV_SCRIPT_DIR, "/data/scripts"),
                (ENV_TIMEOUT_SECS, "7"),
                (ENV_JOBS, "3"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.interpreter, Some(PathBuf::from("/opt/daphne")));
        assert_eq!(settings.script_dir, PathBuf::from("/data/scripts"));
        assert_eq!(settings.timeout, Duration::from_secs(7));
        assert_eq!(settings.jobs, Some(3));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let settings = Settings::defaults(Path::new("/repo"));
        let settings =
            apply_env_overrides(settings, lookup_from(&[(ENV_INTERPRETER, "  ")])).unwrap();
        assert_eq!(settings.interpreter, None);
    }

    #[test]
    fn test_bad_env_number_is_error() {
        let settings = Settings::defaults(Path::new("/repo"));
        let result = apply_env_overrides(settings, lookup_from(&[(ENV_TIMEOUT_SECS, "soon")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_missing_global_config_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let mut loader =
            ConfigLoader::new().with_global_config_path(temp_dir.path().join("absent.toml"));
        assert_eq!(loader.load_global_config().unwrap(), GlobalConfig::default());
    }

    #[test]
    fn test_malformed_global_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[defaults\n").unwrap();

        let mut loader = ConfigLoader::new().with_global_config_path(path);
        assert!(matches!(
            loader.load_global_config(),
            Err(ConfigError::TomlParseError { .. })
        ));
    }
}

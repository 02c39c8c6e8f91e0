//! Suite Configuration (harness.toml)
//!
//! Handles the suite-level configuration stored in `harness.toml` next to the
//! scripts it describes.

use crate::{ConfigError, ConfigResult};
use extsql_harness::{FamilyTable, TestFamily};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suite configuration from harness.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Interpreter and layout settings
    #[serde(default)]
    pub harness: HarnessSection,

    /// Family declarations; the built-in table applies when empty
    #[serde(default, rename = "family", skip_serializing_if = "Vec::is_empty")]
    pub families: Vec<TestFamily>,
}

/// `[harness]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HarnessSection {
    /// Interpreter binary, relative to the file's directory unless absolute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,

    /// Extra interpreter arguments placed before the script path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Script directory, relative to the file's directory unless absolute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,

    /// Script extension (default: "daphne")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_ext: Option<String>,

    /// Reference output extension (default: "ref")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_ext: Option<String>,

    /// Exit status meaning success (default: 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_code: Option<i32>,

    /// Per-run timeout in seconds (default: 120)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Concurrent interpreter runs (default: available parallelism)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl SuiteConfig {
    /// Load suite configuration from a file
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

    /// Validate the suite configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let harness = &self.harness;

        for (field, ext) in [
            ("harness.script_ext", &harness.script_ext),
            ("harness.reference_ext", &harness.reference_ext),
        ] {
            if let Some(ext) = ext {
                validate_extension(field, ext)?;
            }
        }

        if harness.script_ext.is_some() && harness.script_ext == harness.reference_ext {
            return Err(ConfigError::invalid_value(
                "harness.reference_ext",
                "must differ from script_ext",
            ));
        }

        if harness.timeout_secs == Some(0) {
            return Err(ConfigError::invalid_value(
                "harness.timeout_secs",
                "timeout must be at least one second",
            ));
        }

        if harness.jobs == Some(0) {
            return Err(ConfigError::invalid_value(
                "harness.jobs",
                "jobs must be at least 1",
            ));
        }

        FamilyTable::new(self.families.clone()).validate()?;
        Ok(())
    }
}

/// Extensions are bare (no leading dot, no separators)
pub(crate) fn validate_extension(field: &str, ext: &str) -> ConfigResult<()> {
    if ext.is_empty() {
        return Err(ConfigError::invalid_value(field, "extension cannot be empty"));
    }
    if ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(ConfigError::invalid_value(
            field,
            format!("'{}' must be a bare extension like \"daphne\"", ext),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsql_harness::Mode;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[harness]
interpreter = "bin/daphne"
args = ["--vec"]
script_dir = "test/api/cli/externalSQL"
script_ext = "daphne"
reference_ext = "txt"
success_code = 0
timeout_secs = 30
jobs = 4

[[family]]
name = "externalSql_duckdb"
count = 3
mode = "success"
category = "sql"

[[family]]
name = "externalSql_odbc"
count = 1
mode = "comparison"
enabled = false
"#;
        let config: SuiteConfig = toml::from_str(content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.harness.interpreter, Some(PathBuf::from("bin/daphne")));
        assert_eq!(config.harness.args, vec!["--vec".to_string()]);
        assert_eq!(config.harness.jobs, Some(4));
        assert_eq!(config.families.len(), 2);
        assert_eq!(config.families[0].mode, Mode::Success);
        assert!(config.families[0].enabled);
        assert_eq!(config.families[0].category.as_deref(), Some("sql"));
        assert!(!config.families[1].enabled);
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: SuiteConfig = toml::from_str("").unwrap();
        assert!(config.validate().is_ok());
        assert!(config.families.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<SuiteConfig, _> = toml::from_str(
            r#"
[harness]
interpreter = "daphne"
colour = "blue"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<SuiteConfig, _> = toml::from_str(
            r#"
[[family]]
name = "externalSql_sqlite"
count = 3
mode = "maybe"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_count_rejected() {
        let config: SuiteConfig = toml::from_str(
            r#"
[[family]]
name = "externalSql_sqlite"
count = 0
mode = "success"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFamily(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: SuiteConfig = toml::from_str("[harness]\ntimeout_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case("[harness]\nscript_ext = \".daphne\"\n")]
    #[case("[harness]\nreference_ext = \"\"\n")]
    #[case("[harness]\nreference_ext = \"out/ref\"\n")]
    #[case("[harness]\nscript_ext = \"daphne\"\nreference_ext = \"daphne\"\n")]
    #[case("[harness]\njobs = 0\n")]
    fn test_bad_harness_values_rejected(#[case] content: &str) {
        let config: SuiteConfig = toml::from_str(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = SuiteConfig::load_from_file(&temp_dir.path().join("harness.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("harness.toml");
        fs::write(&path, "[harness\n").unwrap();

        let result = SuiteConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
    }

    #[test]
    fn test_serialize_roundtrip_omits_defaults() {
        let config = SuiteConfig {
            families: vec![TestFamily::new("externalSql_sqlite", 3, Mode::Failure)],
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("enabled"));
        assert!(text.contains("mode = \"failure\""));
    }
}

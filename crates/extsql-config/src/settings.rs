//! Resolved harness settings
//!
//! The merged view of defaults, global config, suite config and environment
//! that a run is built from.

use crate::global::GlobalConfig;
use crate::suite::{validate_extension, SuiteConfig};
use crate::{ConfigError, ConfigResult};
use extsql_harness::{FamilyTable, ScriptLayout};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Script directory used when nothing names one
pub const DEFAULT_SCRIPT_DIR: &str = "test/api/cli/externalSQL";
/// Script extension used when nothing names one
pub const DEFAULT_SCRIPT_EXT: &str = "daphne";
/// Reference output extension used when nothing names one
pub const DEFAULT_REFERENCE_EXT: &str = "ref";
/// Per-run timeout used when nothing names one
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Interpreter binary; callers must supply one before running
    pub interpreter: Option<PathBuf>,
    /// Extra interpreter arguments placed before the script path
    pub args: Vec<String>,
    /// Directory holding scripts and references
    pub script_dir: PathBuf,
    pub script_ext: String,
    pub reference_ext: String,
    /// Exit status meaning success
    pub success_code: i32,
    /// Per-run timeout
    pub timeout: Duration,
    /// Concurrent interpreter runs; rayon's default when unset
    pub jobs: Option<usize>,
    /// Family declarations in run order
    pub families: FamilyTable,
    /// The harness.toml these settings came from, if any
    pub config_path: Option<PathBuf>,
}

impl Settings {
    /// Built-in defaults rooted at `base_dir`
    pub fn defaults(base_dir: &Path) -> Self {
        Self {
            interpreter: None,
            args: Vec::new(),
            script_dir: base_dir.join(DEFAULT_SCRIPT_DIR),
            script_ext: DEFAULT_SCRIPT_EXT.to_string(),
            reference_ext: DEFAULT_REFERENCE_EXT.to_string(),
            success_code: 0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            jobs: None,
            families: FamilyTable::external_sql(),
            config_path: None,
        }
    }

    /// Layer global user defaults over the built-in ones
    pub fn merge_global(mut self, global: &GlobalConfig) -> Self {
        if let Some(interpreter) = global.interpreter() {
            self.interpreter = Some(interpreter.to_path_buf());
        }
        if let Some(secs) = global.timeout_secs() {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(jobs) = global.jobs() {
            self.jobs = Some(jobs);
        }
        if let Some(ext) = global.reference_ext() {
            self.reference_ext = ext.to_string();
        }
        self
    }

    /// Layer a suite file over the current settings
    ///
    /// Relative paths in the file resolve against the file's directory.
    pub fn merge_suite(mut self, suite: SuiteConfig, config_path: &Path) -> Self {
        let root = config_path.parent().unwrap_or_else(|| Path::new("."));
        let harness = suite.harness;

        if let Some(interpreter) = harness.interpreter {
            self.interpreter = Some(resolve_program(root, interpreter));
        }
        if !harness.args.is_empty() {
            self.args = harness.args;
        }
        self.script_dir = match harness.script_dir {
            Some(dir) => resolve_against(root, dir),
            None => root.join(DEFAULT_SCRIPT_DIR),
        };
        if let Some(ext) = harness.script_ext {
            self.script_ext = ext;
        }
        if let Some(ext) = harness.reference_ext {
            self.reference_ext = ext;
        }
        if let Some(code) = harness.success_code {
            self.success_code = code;
        }
        if let Some(secs) = harness.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(jobs) = harness.jobs {
            self.jobs = Some(jobs);
        }
        if !suite.families.is_empty() {
            self.families = FamilyTable::new(suite.families);
        }
        self.config_path = Some(config_path.to_path_buf());
        self
    }

    /// Script naming and location for the enumerator
    pub fn layout(&self) -> ScriptLayout {
        ScriptLayout::new(&self.script_dir, &self.script_ext, &self.reference_ext)
    }

    /// The interpreter, or an error naming every way to supply one
    pub fn require_interpreter(&self) -> ConfigResult<&Path> {
        self.interpreter.as_deref().ok_or_else(|| {
            ConfigError::invalid_value(
                "interpreter",
                "no interpreter configured (set harness.interpreter, EXTSQL_INTERPRETER or --interpreter)",
            )
        })
    }

    /// Validate the merged result, including caller overrides
    pub fn validate(&self) -> ConfigResult<()> {
        validate_extension("script_ext", &self.script_ext)?;
        validate_extension("reference_ext", &self.reference_ext)?;
        if self.script_ext == self.reference_ext {
            return Err(ConfigError::invalid_value(
                "reference_ext",
                "must differ from script_ext",
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid_value(
                "timeout",
                "timeout must be greater than zero",
            ));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::invalid_value("jobs", "jobs must be at least 1"));
        }
        self.families.validate()?;
        Ok(())
    }
}

/// Bare program names stay as-is so they are looked up on PATH
fn resolve_program(root: &Path, path: PathBuf) -> PathBuf {
    if path.components().count() == 1 && !path.is_absolute() {
        path
    } else {
        resolve_against(root, path)
    }
}

fn resolve_against(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

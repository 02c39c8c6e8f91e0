pub mod audit;
pub mod list;
pub mod run;

use anyhow::{Context, Result};
use clap::Args;
use extsql_config::{ConfigLoader, Settings};
use extsql_harness::{FamilyTable, Mode};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Options shared by every command that reads a suite
#[derive(Args, Debug, Clone, Default)]
pub struct SuiteArgs {
    /// Path to harness.toml (default: search upward from the current directory)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Script directory (overrides harness.script_dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Interpreter binary (overrides harness.interpreter)
    #[arg(long, short = 'i')]
    pub interpreter: Option<PathBuf>,
    /// Per-run timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Concurrent interpreter runs
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
}

impl SuiteArgs {
    /// Resolve settings: config files and environment, then these flags
    pub fn load(&self) -> Result<Settings> {
        let mut loader = ConfigLoader::new();
        let mut settings = match &self.config {
            Some(path) => loader
                .load_from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => loader.load_from_directory(&std::env::current_dir()?)?,
        };

        if let Some(dir) = &self.dir {
            settings.script_dir = dir.clone();
        }
        if let Some(interpreter) = &self.interpreter {
            settings.interpreter = Some(interpreter.clone());
        }
        if let Some(secs) = self.timeout {
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(jobs) = self.jobs {
            settings.jobs = Some(jobs);
        }

        settings.validate()?;
        debug!(?settings, "resolved settings");
        Ok(settings)
    }
}

/// Family selection shared by run and list
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Only families whose name contains this pattern
    pub pattern: Option<String>,
    /// Only families of this mode (success, failure, comparison)
    #[arg(long, short = 'm')]
    pub mode: Option<Mode>,
    /// Run families that are disabled in the table
    #[arg(long)]
    pub include_disabled: bool,
}

impl SelectArgs {
    pub fn apply(&self, table: &FamilyTable) -> FamilyTable {
        let mut selected = match &self.pattern {
            Some(pattern) => table.filter(pattern),
            None => table.clone(),
        };
        if let Some(mode) = self.mode {
            selected = selected.with_mode(mode);
        }
        if self.include_disabled {
            selected = selected.enable_all();
        }
        selected
    }
}

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
    Cancelled,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failure => 1,
            RunStatus::Cancelled => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_by_pattern_and_mode() {
        let table = FamilyTable::external_sql();
        let select = SelectArgs {
            pattern: Some("sqlite".to_string()),
            mode: Some(Mode::Failure),
            include_disabled: false,
        };

        let selected = select.apply(&table);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.families()[0].label(), "externalSql_sqlite (failure)");
    }

    #[test]
    fn test_select_include_disabled() {
        let table = FamilyTable::external_sql();
        let select = SelectArgs {
            pattern: Some("odbc".to_string()),
            include_disabled: true,
            ..Default::default()
        };

        let selected = select.apply(&table);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|f| f.enabled));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Success.exit_code(), 0);
        assert_eq!(RunStatus::Failure.exit_code(), 1);
        assert_eq!(RunStatus::Cancelled.exit_code(), 130);
    }
}

//! Configuration loading and precedence tests
//!
//! Every test reads the process environment through the loader, so they run
//! serially.

use extsql_config::loader::{ENV_INTERPRETER, ENV_JOBS, ENV_TIMEOUT_SECS};
use extsql_config::{ConfigError, ConfigLoader};
use extsql_harness::{FamilyTable, Mode};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("harness.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

/// Loader isolated from the real ~/.extsql
fn loader(temp_dir: &TempDir) -> ConfigLoader {
    ConfigLoader::new().with_global_config_path(temp_dir.path().join("global.toml"))
}

fn clear_env() {
    for key in [ENV_INTERPRETER, ENV_JOBS, ENV_TIMEOUT_SECS, "EXTSQL_SCRIPT_DIR"] {
        env::remove_var(key);
    }
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_suite_config_basic() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[harness]
interpreter = "bin/daphne"
script_dir = "test/api/cli/externalSQL"
timeout_secs = 30

[[family]]
name = "externalSql_sqlite"
count = 3
mode = "comparison"
"#,
    );

    let settings = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(
        settings.interpreter,
        Some(temp_dir.path().join("bin/daphne"))
    );
    assert_eq!(
        settings.script_dir,
        temp_dir.path().join("test/api/cli/externalSQL")
    );
    assert_eq!(settings.timeout, Duration::from_secs(30));
    assert_eq!(settings.families.len(), 1);
    assert_eq!(settings.families.families()[0].mode, Mode::Comparison);
    assert_eq!(
        settings.config_path,
        Some(temp_dir.path().join("harness.toml"))
    );
}

#[test]
#[serial]
fn test_load_when_no_config_exists() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let settings = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(settings.config_path, None);
    assert_eq!(settings.interpreter, None);
    assert_eq!(settings.families, FamilyTable::external_sql());
    assert_eq!(settings.families.variant_count(), 16);
}

#[test]
#[serial]
fn test_load_from_nested_directory() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[harness]\nscript_dir = \"scripts\"\n");
    let nested = temp_dir.path().join("scripts");
    fs::create_dir_all(&nested).unwrap();

    let settings = loader(&temp_dir).load_from_directory(&nested).unwrap();
    assert_eq!(settings.script_dir, nested);
}

#[test]
#[serial]
fn test_load_from_explicit_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let suite_dir = temp_dir.path().join("suite");
    fs::create_dir_all(&suite_dir).unwrap();
    let path = suite_dir.join("custom.toml");
    fs::write(&path, "[harness]\nreference_ext = \"out\"\n").unwrap();

    let settings = loader(&temp_dir).load_from_file(&path).unwrap();
    assert_eq!(settings.reference_ext, "out");
    assert_eq!(
        settings.script_dir,
        suite_dir.join("test/api/cli/externalSQL")
    );
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let result = loader(&temp_dir).load_from_file(&temp_dir.path().join("nope.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_invalid_suite_is_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[[family]]
name = "externalSql_duckdb"
count = 2
mode = "failure"

[[family]]
name = "externalSql_duckdb"
count = 3
mode = "failure"
"#,
    );

    let result = loader(&temp_dir).load_from_directory(temp_dir.path());
    assert!(matches!(result, Err(ConfigError::InvalidFamily(_))));
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_global_defaults_apply_beneath_suite() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("global.toml"),
        "[defaults]\ninterpreter = \"/opt/daphne/bin/daphne\"\njobs = 2\ntimeout_secs = 60\n",
    )
    .unwrap();
    create_config_file(temp_dir.path(), "[harness]\ntimeout_secs = 10\n");

    let settings = loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(
        settings.interpreter,
        Some(PathBuf::from("/opt/daphne/bin/daphne"))
    );
    assert_eq!(settings.jobs, Some(2));
    assert_eq!(settings.timeout, Duration::from_secs(10));
}

#[test]
#[serial]
fn test_env_overrides_suite() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        "[harness]\ninterpreter = \"bin/daphne\"\ntimeout_secs = 30\njobs = 8\n",
    );

    env::set_var(ENV_INTERPRETER, "/usr/local/bin/daphne");
    env::set_var(ENV_TIMEOUT_SECS, "5");
    env::set_var(ENV_JOBS, "1");
    let result = loader(&temp_dir).load_from_directory(temp_dir.path());
    clear_env();

    let settings = result.unwrap();
    assert_eq!(
        settings.interpreter,
        Some(PathBuf::from("/usr/local/bin/daphne"))
    );
    assert_eq!(settings.timeout, Duration::from_secs(5));
    assert_eq!(settings.jobs, Some(1));
}

#[test]
#[serial]
fn test_invalid_env_value_is_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    env::set_var(ENV_JOBS, "many");
    let result = loader(&temp_dir).load_from_directory(temp_dir.path());
    clear_env();

    match result {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, ENV_JOBS),
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}

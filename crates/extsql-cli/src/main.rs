use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod reporter;

use commands::{RunStatus, SelectArgs, SuiteArgs};

/// Conformance runner for an interpreter's external-SQL scripts.
///
/// Runs each numbered script variant through the interpreter and checks the
/// exit status, or compares stdout byte for byte against a reference file.
///
/// EXAMPLES:
///     extsql run                          Run every enabled family
///     extsql run sqlite --mode failure    Only the SQLite failure family
///     extsql list                         Show families and script paths
///     extsql audit                        Check scripts on disk against the table
///
/// ENVIRONMENT VARIABLES:
///     EXTSQL_INTERPRETER   Interpreter binary
///     EXTSQL_SCRIPT_DIR    Script directory
///     EXTSQL_TIMEOUT_SECS  Per-run timeout in seconds
///     EXTSQL_JOBS          Concurrent interpreter runs
///     EXTSQL_JSON          Set to '1' for JSON output by default
///     NO_COLOR             Set to disable colored output
///     RUST_LOG             Log filter (default: warn)
#[derive(Parser)]
#[command(name = "extsql")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run script families against the interpreter
    ///
    /// Every variant of every selected family runs, even after failures.
    /// Exits 1 if any variant failed and 130 when interrupted.
    ///
    /// EXAMPLES:
    ///     extsql run --interpreter bin/daphne
    ///     extsql run duckdb --sequential
    ///     extsql run --mode comparison --json
    ///     extsql run odbc --include-disabled
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        suite: SuiteArgs,
        #[command(flatten)]
        select: SelectArgs,
        /// Run variants one at a time
        #[arg(long)]
        sequential: bool,
        /// Show one line per variant
        #[arg(long)]
        details: bool,
        /// Disable colored output (also NO_COLOR or EXTSQL_NO_COLOR)
        #[arg(long)]
        no_color: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the family table and the scripts each variant resolves to
    ///
    /// EXAMPLES:
    ///     extsql list
    ///     extsql list sqlite --json
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        suite: SuiteArgs,
        #[command(flatten)]
        select: SelectArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Compare declared counts against the scripts on disk
    ///
    /// Reports gaps, scripts beyond a family's count, and comparison
    /// scripts without a reference file. Exits 1 if anything is out of step.
    ///
    /// EXAMPLES:
    ///     extsql audit
    ///     extsql audit --dir test/api/cli/externalSQL --json
    Audit {
        #[command(flatten)]
        suite: SuiteArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     extsql completions bash > ~/.bash_completions/extsql.bash
    ///     extsql completions zsh > ~/.zfunc/_extsql
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli) {
        Ok(status) => ExitCode::from(status.exit_code() as u8),
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn dispatch(cli: Cli) -> Result<RunStatus> {
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Run {
            suite,
            select,
            sequential,
            details,
            no_color,
            json,
        } => {
            // Command-line flag overrides environment variable
            let args = commands::run::RunArgs {
                suite,
                select,
                sequential,
                verbose: details,
                no_color: no_color || cli_config.no_color,
                json: json || cli_config.default_json,
            };
            commands::run::run(args)
        }
        Commands::List {
            suite,
            select,
            json,
        } => {
            if cli_config.no_color {
                colored::control::set_override(false);
            }
            let args = commands::list::ListArgs {
                suite,
                select,
                json: json || cli_config.default_json,
            };
            commands::list::run(args)?;
            Ok(RunStatus::Success)
        }
        Commands::Audit { suite, json } => {
            if cli_config.no_color {
                colored::control::set_override(false);
            }
            let args = commands::audit::AuditArgs {
                suite,
                json: json || cli_config.default_json,
            };
            commands::audit::run(args)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(RunStatus::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsql_harness::Mode;
    use std::path::PathBuf;

    #[test]
    fn test_cli_smoke() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "extsql",
            "run",
            "sqlite",
            "--interpreter",
            "bin/daphne",
            "--mode",
            "comparison",
            "--jobs",
            "4",
            "--timeout",
            "30",
            "--sequential",
        ]);
        match cli.command {
            Commands::Run {
                suite,
                select,
                sequential,
                ..
            } => {
                assert_eq!(suite.interpreter, Some(PathBuf::from("bin/daphne")));
                assert_eq!(suite.jobs, Some(4));
                assert_eq!(suite.timeout, Some(30));
                assert_eq!(select.pattern.as_deref(), Some("sqlite"));
                assert_eq!(select.mode, Some(Mode::Comparison));
                assert!(sequential);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_global_verbose_flag() {
        let cli = Cli::parse_from(["extsql", "list", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_bad_mode_rejected() {
        let result = Cli::try_parse_from(["extsql", "run", "--mode", "sometimes"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_alias_r_for_run() {
        let cli = Cli::parse_from(["extsql", "r"]);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }

    #[test]
    fn test_completions_bash() {
        let cli = Cli::parse_from(["extsql", "completions", "bash"]);
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Bash),
            _ => panic!("Expected Completions command"),
        }
    }
}

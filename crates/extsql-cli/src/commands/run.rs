//! Run command - execute the selected families against the interpreter

use crate::commands::{RunStatus, SelectArgs, SuiteArgs};
use crate::reporter::{json_report, RunReporter};
use anyhow::Result;
use colored::*;
use extsql_harness::{CancelToken, CaseEnumerator, FamilyReport, Invoker, RunSummary, TestFamily};
use std::time::Instant;
#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{info, warn};

/// Arguments for the run command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub suite: SuiteArgs,
    pub select: SelectArgs,
    /// Run variants one at a time
    pub sequential: bool,
    /// One line per variant instead of progress dots
    pub verbose: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Output in JSON format
    pub json: bool,
}

/// Run the run command
pub fn run(args: RunArgs) -> Result<RunStatus> {
    let settings = args.suite.load()?;
    let interpreter = settings.require_interpreter()?.to_path_buf();
    let table = args.select.apply(&settings.families);

    if table.is_empty() {
        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "families": 0,
                    "variants": 0,
                    "passed": true,
                    "message": "No families matched"
                })
            );
        } else {
            println!("{}", "No families matched.".yellow());
        }
        return Ok(RunStatus::Success);
    }

    if !args.json {
        println!(
            "Running {} famil{} ({} variants) from {}",
            table.len().to_string().bold(),
            if table.len() == 1 { "y" } else { "ies" },
            table.variant_count(),
            settings.script_dir.display()
        );
        println!();
    }

    let cancel = CancelToken::new();
    let invoker = Invoker::new(interpreter)
        .with_args(settings.args.clone())
        .with_timeout(settings.timeout)
        .with_cancel_token(cancel.clone());

    let mut enumerator = CaseEnumerator::new(settings.layout(), invoker.clone())
        .with_success_code(settings.success_code)
        .with_parallel(!args.sequential);
    if let Some(jobs) = settings.jobs {
        enumerator = enumerator.with_jobs(jobs)?;
    }

    let started = Instant::now();
    let reports = run_until_interrupted(enumerator, table.into_vec(), cancel.clone())?;
    let elapsed = started.elapsed();

    if args.json {
        println!("{}", json_report(&reports, &invoker, elapsed));
    } else {
        let reporter = RunReporter::new(args.verbose).with_no_color(args.no_color);
        reporter.report(&reports, &invoker, elapsed);
    }

    let summary = RunSummary::from_reports(&reports);
    info!(
        families = summary.families,
        failed = summary.families_failed,
        elapsed_ms = elapsed.as_millis() as u64,
        "run finished"
    );

    if cancel.is_cancelled() {
        return Ok(RunStatus::Cancelled);
    }
    if summary.is_success() {
        Ok(RunStatus::Success)
    } else {
        Ok(RunStatus::Failure)
    }
}

/// Run every family on a blocking thread while a shutdown signal cancels the token
///
/// Always waits for the blocking run to return, so every in-flight
/// interpreter has been killed and reaped before the process exits.
fn run_until_interrupted(
    enumerator: CaseEnumerator,
    families: Vec<TestFamily>,
    cancel: CancelToken,
) -> Result<Vec<FamilyReport>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        // Install handlers before the first interpreter starts
        let signals = ShutdownSignals::install()?;
        let listener = tokio::spawn(async move {
            let name = signals.recv().await;
            warn!(signal = name, "interrupted, cancelling outstanding runs");
            cancel.cancel();
        });

        let reports =
            tokio::task::spawn_blocking(move || enumerator.run_all(&families)).await?;

        listener.abort();
        Ok::<_, anyhow::Error>(reports)
    })
}

/// Signals that abort a run
#[cfg(unix)]
struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the first of SIGINT, SIGTERM or SIGHUP and name it
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl-C",
            Err(_) => std::future::pending().await,
        }
    }
}

//! Run reporter - display family and variant results

use colored::*;
use extsql_harness::{
    CaseOutcome, FamilyReport, FamilyVerdict, Invoker, RunSummary, VariantReport,
};
use std::io::{self, Write};
use std::time::Duration;

/// Run reporter with output configuration
pub struct RunReporter {
    /// Show one line per variant instead of progress dots
    verbose: bool,
    /// Disable colored output
    no_color: bool,
}

impl Default for RunReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RunReporter {
    /// Create a new run reporter
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Report run results; `elapsed` is the wall-clock time of the whole run
    pub fn report(&self, reports: &[FamilyReport], invoker: &Invoker, elapsed: Duration) {
        if self.no_color {
            colored::control::set_override(false);
        }

        for report in reports {
            self.print_family(report);
        }

        if !self.verbose && !reports.is_empty() {
            println!();
        }

        println!();
        self.print_summary(&RunSummary::from_reports(reports), elapsed);
        self.print_failures(reports, invoker);

        if self.no_color {
            colored::control::unset_override();
        }
    }

    fn print_family(&self, report: &FamilyReport) {
        if !self.verbose {
            match report.verdict {
                FamilyVerdict::Skipped => print!("{}", "S".yellow()),
                _ if report.setup_error.is_some() => print!("{}", "E".red().bold()),
                _ => {
                    for variant in &report.variants {
                        print_dot(variant);
                    }
                }
            }
            let _ = io::stdout().flush();
            return;
        }

        let label = family_label(report);
        match report.verdict {
            FamilyVerdict::Passed => println!(
                "{} {} ({}/{}, {:.2?})",
                "PASS".green().bold(),
                label,
                report.passed_count(),
                report.variants.len(),
                report.duration()
            ),
            FamilyVerdict::Failed => println!(
                "{} {} ({}/{}, {:.2?})",
                "FAIL".red().bold(),
                label,
                report.passed_count(),
                report.variants.len(),
                report.duration()
            ),
            FamilyVerdict::Skipped => println!("{} {} (disabled)", "SKIP".yellow().bold(), label),
        }

        for variant in &report.variants {
            let status = match &variant.outcome {
                CaseOutcome::Passed => "ok".green(),
                CaseOutcome::Failed(error) => error.kind().red(),
            };
            println!(
                "    {} {} ({:.2?})",
                variant.variant.index,
                status,
                variant.duration
            );
        }
    }

    fn print_summary(&self, summary: &RunSummary, elapsed: Duration) {
        println!("{}", "─".repeat(50));

        let status = if summary.is_success() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };

        println!(
            "Run result: {} | {} families: {} passed, {} failed, {} skipped",
            status,
            summary.families.to_string().bold(),
            summary.families_passed.to_string().green().bold(),
            if summary.families_failed > 0 {
                summary.families_failed.to_string().red().bold()
            } else {
                summary.families_failed.to_string().normal()
            },
            summary.families_skipped.to_string().yellow()
        );
        println!(
            "Variants: {} run, {} passed, {} failed",
            summary.variants,
            summary.variants_passed,
            summary.variants_failed
        );
        println!(
            "Time: {:.2?} (interpreter time {:.2?})",
            elapsed, summary.duration
        );
    }

    fn print_failures(&self, reports: &[FamilyReport], invoker: &Invoker) {
        let failed: Vec<_> = reports.iter().filter(|r| r.is_failed()).collect();
        if failed.is_empty() {
            return;
        }

        println!();
        println!("{}", "Failures:".red().bold());
        println!();

        for report in failed {
            if let Some(error) = &report.setup_error {
                println!("  {} {}", "●".red(), family_label(report).bold());
                for line in error.to_string().lines() {
                    println!("      {}", line.dimmed());
                }
                println!();
            }

            for variant in report.failures() {
                print_variant_failure(report, variant, invoker);
            }
        }
    }
}

fn print_dot(variant: &VariantReport) {
    if variant.outcome.is_pass() {
        print!("{}", ".".green());
    } else {
        print!("{}", "F".red().bold());
    }
}

fn print_variant_failure(report: &FamilyReport, variant: &VariantReport, invoker: &Invoker) {
    println!(
        "  {} {} {} #{}",
        "●".red(),
        report.family.name.bold(),
        variant.variant.kind.name(),
        variant.variant.index
    );
    println!("    {}", variant.script.display());

    if let Some(error) = variant.outcome.error() {
        for line in error.to_string().lines() {
            println!("      {}", line.dimmed());
        }
    }
    println!(
        "    {} {}",
        "rerun:".dimmed(),
        invoker.command_line(&variant.script)
    );
    println!();
}

fn family_label(report: &FamilyReport) -> String {
    match &report.family.category {
        Some(category) => format!("{} [{}]", report.family.label(), category),
        None => report.family.label(),
    }
}

/// JSON rendering of a run, one object per family
pub fn json_report(
    reports: &[FamilyReport],
    invoker: &Invoker,
    elapsed: Duration,
) -> serde_json::Value {
    let summary = RunSummary::from_reports(reports);

    let families: Vec<_> = reports
        .iter()
        .map(|report| {
            let variants: Vec<_> = report
                .variants
                .iter()
                .map(|v| {
                    serde_json::json!({
                        "index": v.variant.index,
                        "kind": v.variant.kind.name(),
                        "script": v.script.display().to_string(),
                        "passed": v.outcome.is_pass(),
                        "error_kind": v.outcome.error().map(|e| e.kind()),
                        "error": v.outcome.error().map(|e| e.to_string()),
                        "command": invoker.command_line(&v.script),
                        "duration_ms": v.duration.as_millis(),
                    })
                })
                .collect();

            serde_json::json!({
                "family": report.family.name,
                "mode": report.mode().name(),
                "category": report.family.category,
                "verdict": report.verdict.name(),
                "setup_error": report.setup_error.as_ref().map(|e| e.to_string()),
                "failing_indices": report.failing_indices(),
                "variants": variants,
            })
        })
        .collect();

    serde_json::json!({
        "passed": summary.is_success(),
        "families": summary.families,
        "families_passed": summary.families_passed,
        "families_failed": summary.families_failed,
        "families_skipped": summary.families_skipped,
        "variants": summary.variants,
        "variants_passed": summary.variants_passed,
        "variants_failed": summary.variants_failed,
        "elapsed_ms": elapsed.as_millis(),
        "interpreter_ms": summary.duration.as_millis(),
        "results": families,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsql_harness::{HarnessError, Mode, TestFamily, Variant, VariantKind};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn variant_report(index: u32, outcome: CaseOutcome) -> VariantReport {
        VariantReport {
            variant: Variant {
                family: "externalSql_sqlite".to_string(),
                kind: VariantKind::Failure,
                index,
            },
            script: PathBuf::from(format!(
                "scripts/externalSql_sqlite_failure_{}.daphne",
                index
            )),
            outcome,
            duration: Duration::from_millis(5),
        }
    }

    fn sample_reports() -> Vec<FamilyReport> {
        let failing = FamilyReport::from_variants(
            TestFamily::new("externalSql_sqlite", 2, Mode::Failure).with_category("literals"),
            vec![
                variant_report(1, CaseOutcome::Passed),
                variant_report(
                    2,
                    CaseOutcome::Failed(HarnessError::StatusMismatch {
                        expected: extsql_harness::StatusExpectation::AnyFailure { success: 0 },
                        observed: 0,
                    }),
                ),
            ],
        );
        let skipped = FamilyReport::skipped(
            TestFamily::new("externalSql_odbc", 1, Mode::Success).with_enabled(false),
        );
        vec![failing, skipped]
    }

    #[test]
    fn test_reporter_verbose_with_failures() {
        let reporter = RunReporter::new(true).with_no_color(true);
        reporter.report(&sample_reports(), &Invoker::new("daphne"), Duration::from_millis(7));
    }

    #[test]
    fn test_reporter_quiet_mode() {
        let reporter = RunReporter::new(false).with_no_color(true);
        reporter.report(&sample_reports(), &Invoker::new("daphne"), Duration::from_millis(7));
    }

    #[test]
    fn test_reporter_empty() {
        let reporter = RunReporter::new(true).with_no_color(true);
        reporter.report(&[], &Invoker::new("daphne"), Duration::ZERO);
    }

    #[test]
    fn test_json_report_names_failing_variant() {
        let json = json_report(
            &sample_reports(),
            &Invoker::new("bin/daphne"),
            Duration::from_millis(7),
        );

        assert_eq!(json["passed"], false);
        assert_eq!(json["families_failed"], 1);
        assert_eq!(json["families_skipped"], 1);
        assert_eq!(json["elapsed_ms"], 7);

        let family = &json["results"][0];
        assert_eq!(family["family"], "externalSql_sqlite");
        assert_eq!(family["mode"], "failure");
        assert_eq!(family["category"], "literals");
        assert_eq!(family["failing_indices"], serde_json::json!([2]));

        let variant = &family["variants"][1];
        assert_eq!(variant["kind"], "failure");
        assert_eq!(variant["error_kind"], "status-mismatch");
        assert_eq!(
            variant["command"],
            "bin/daphne scripts/externalSql_sqlite_failure_2.daphne"
        );

        assert_eq!(json["results"][1]["verdict"], "skipped");
    }
}

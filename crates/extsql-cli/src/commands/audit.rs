//! Audit command - compare declared counts against the script directory

use crate::commands::{RunStatus, SuiteArgs};
use anyhow::Result;
use colored::*;
use extsql_harness::{audit, FamilyAudit, LayoutAudit};

/// Arguments for the audit command
#[derive(Debug, Clone, Default)]
pub struct AuditArgs {
    pub suite: SuiteArgs,
    /// Output in JSON format
    pub json: bool,
}

/// Run the audit command
pub fn run(args: AuditArgs) -> Result<RunStatus> {
    let settings = args.suite.load()?;
    let report = audit(&settings.layout(), settings.families.families())?;

    if args.json {
        println!("{}", json_audit(&report));
    } else {
        print_audit(&report);
    }

    if report.is_clean() {
        Ok(RunStatus::Success)
    } else {
        Ok(RunStatus::Failure)
    }
}

fn print_audit(report: &LayoutAudit) {
    for family in &report.families {
        if family.is_clean() {
            println!("{} {}", "ok".green().bold(), family.family.label());
            continue;
        }

        println!("{} {}", "!!".red().bold(), family.family.label());
        print_indices("missing scripts", &family.missing_scripts);
        print_indices("undeclared scripts", &family.undeclared_scripts);
        print_indices("missing references", &family.missing_references);
    }

    println!();
    let problems = report.problems().count();
    if problems == 0 {
        println!("{}", "Layout matches the family table.".green());
    } else {
        println!(
            "{} famil{} out of step with the script directory",
            problems.to_string().red().bold(),
            if problems == 1 { "y" } else { "ies" }
        );
    }
}

fn print_indices(what: &str, indices: &[u32]) {
    if indices.is_empty() {
        return;
    }
    let list: Vec<String> = indices.iter().map(u32::to_string).collect();
    println!("    {}: {}", what, list.join(", "));
}

fn json_audit(report: &LayoutAudit) -> serde_json::Value {
    let families: Vec<_> = report
        .families
        .iter()
        .map(|f: &FamilyAudit| {
            serde_json::json!({
                "family": f.family.name,
                "mode": f.family.mode.name(),
                "clean": f.is_clean(),
                "missing_scripts": f.missing_scripts,
                "undeclared_scripts": f.undeclared_scripts,
                "missing_references": f.missing_references,
            })
        })
        .collect();

    serde_json::json!({
        "clean": report.is_clean(),
        "families": families,
    })
}

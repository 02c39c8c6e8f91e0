//! List command - show the family table and the scripts it resolves to

use crate::commands::{SelectArgs, SuiteArgs};
use anyhow::Result;
use colored::*;
use extsql_harness::{FamilyTable, ScriptLayout};

/// Arguments for the list command
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub suite: SuiteArgs,
    pub select: SelectArgs,
    /// Output in JSON format
    pub json: bool,
}

/// Run the list command
pub fn run(args: ListArgs) -> Result<()> {
    let settings = args.suite.load()?;
    let table = args.select.apply(&settings.families);
    let layout = settings.layout();

    if args.json {
        println!("{}", json_listing(&table, &layout)?);
        return Ok(());
    }

    if table.is_empty() {
        println!("{}", "No families matched.".yellow());
        return Ok(());
    }

    for family in &table {
        let state = if family.enabled {
            format!("{} variant{}", family.count, if family.count == 1 { "" } else { "s" })
                .normal()
        } else {
            "disabled".yellow()
        };
        println!("{} ({})", family.label().bold(), state);

        for variant in family.variants()? {
            let script = layout.script_for(&variant)?;
            println!("    {}", script.display());
        }
    }

    println!();
    println!(
        "{} families, {} enabled variants",
        table.len(),
        table.variant_count()
    );
    Ok(())
}

fn json_listing(table: &FamilyTable, layout: &ScriptLayout) -> Result<serde_json::Value> {
    let mut families = Vec::with_capacity(table.len());
    for family in table {
        let scripts = family
            .variants()?
            .iter()
            .map(|v| layout.script_for(v).map(|p| p.display().to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        families.push(serde_json::json!({
            "family": family.name,
            "mode": family.mode.name(),
            "count": family.count,
            "enabled": family.enabled,
            "category": family.category,
            "scripts": scripts,
        }));
    }

    Ok(serde_json::json!({
        "script_dir": layout.dir.display().to_string(),
        "families": families,
    }))
}

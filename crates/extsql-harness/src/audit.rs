//! Layout audit - compare declared families against the scripts on disk

use crate::error::{HarnessError, HarnessResult};
use crate::family::{Mode, TestFamily, Variant};
use crate::locator::ScriptLayout;
use std::collections::HashSet;
use walkdir::WalkDir;

/// Audit of one declared family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyAudit {
    pub family: TestFamily,
    /// Indices within 1..=count with no script
    pub missing_scripts: Vec<u32>,
    /// Indices above count that have a script
    pub undeclared_scripts: Vec<u32>,
    /// Comparison indices with a script but no reference output
    pub missing_references: Vec<u32>,
}

impl FamilyAudit {
    pub fn is_clean(&self) -> bool {
        self.missing_scripts.is_empty()
            && self.undeclared_scripts.is_empty()
            && self.missing_references.is_empty()
    }
}

/// Audit of a whole family table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutAudit {
    pub families: Vec<FamilyAudit>,
}

impl LayoutAudit {
    pub fn is_clean(&self) -> bool {
        self.families.iter().all(FamilyAudit::is_clean)
    }

    pub fn problems(&self) -> impl Iterator<Item = &FamilyAudit> {
        self.families.iter().filter(|f| !f.is_clean())
    }
}

/// Check that every declared count matches the scripts present
pub fn audit(layout: &ScriptLayout, families: &[TestFamily]) -> HarnessResult<LayoutAudit> {
    let files = list_files(layout)?;

    let mut audits = Vec::with_capacity(families.len());
    for family in families {
        family.validate()?;
        audits.push(audit_family(layout, family, &files));
    }

    Ok(LayoutAudit { families: audits })
}

fn list_files(layout: &ScriptLayout) -> HarnessResult<HashSet<String>> {
    let mut files = HashSet::new();
    for entry in WalkDir::new(&layout.dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| HarnessError::io(&layout.dir, e.into()))?;
        if entry.file_type().is_file() {
            files.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(files)
}

fn audit_family(layout: &ScriptLayout, family: &TestFamily, files: &HashSet<String>) -> FamilyAudit {
    let kind = family.mode.kind();
    let file_name = |index: u32, ext: &str| {
        let variant = Variant {
            family: family.name.clone(),
            kind,
            index,
        };
        format!("{}.{}", variant.stem(), ext)
    };

    let mut missing_scripts = Vec::new();
    let mut missing_references = Vec::new();
    for index in 1..=family.count {
        if !files.contains(&file_name(index, &layout.script_ext)) {
            missing_scripts.push(index);
        } else if family.mode == Mode::Comparison
            && !files.contains(&file_name(index, &layout.reference_ext))
        {
            missing_references.push(index);
        }
    }

    let prefix = match kind.suffix() {
        Some(suffix) => format!("{}_{}_", family.name, suffix),
        None => format!("{}_", family.name),
    };
    let extension = format!(".{}", layout.script_ext);
    let mut undeclared_scripts: Vec<u32> = files
        .iter()
        .filter_map(|name| name.strip_prefix(&prefix)?.strip_suffix(&extension))
        .filter_map(parse_index)
        .filter(|&index| index > family.count)
        .collect();
    undeclared_scripts.sort_unstable();

    FamilyAudit {
        family: family.clone(),
        missing_scripts,
        undeclared_scripts,
        missing_references,
    }
}

/// Canonical decimal index as the locator writes it: digits only, no leading zero
fn parse_index(text: &str) -> Option<u32> {
    if text.is_empty() || text.starts_with('0') || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

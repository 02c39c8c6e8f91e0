//! Script locator - derive script and reference paths from variant coordinates

use crate::error::{HarnessError, HarnessResult};
use crate::family::{Variant, VariantKind};
use std::path::{Path, PathBuf};

/// Resolve the script path `<dir>/<family>[_<kind>]_<index>.<ext>`
///
/// Pure path construction; the file is not required to exist.
pub fn locate(
    dir: &Path,
    family: &str,
    kind: VariantKind,
    index: u32,
    script_ext: &str,
) -> HarnessResult<PathBuf> {
    if index == 0 {
        return Err(HarnessError::invalid_variant(
            family,
            "variant indices start at 1",
        ));
    }
    if family.trim().is_empty() {
        return Err(HarnessError::invalid_variant(
            family,
            "family name cannot be empty",
        ));
    }

    let variant = Variant {
        family: family.to_string(),
        kind,
        index,
    };
    Ok(dir.join(format!("{}.{}", variant.stem(), script_ext)))
}

/// Reference output path for a script: same base path, reference extension
pub fn reference_path(script: &Path, reference_ext: &str) -> PathBuf {
    script.with_extension(reference_ext)
}

/// Where scripts live and how their files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLayout {
    /// Directory holding scripts and reference outputs
    pub dir: PathBuf,
    /// Script extension (e.g., "daphne")
    pub script_ext: String,
    /// Reference output extension (e.g., "ref")
    pub reference_ext: String,
}

impl ScriptLayout {
    pub fn new(
        dir: impl Into<PathBuf>,
        script_ext: impl Into<String>,
        reference_ext: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            script_ext: script_ext.into(),
            reference_ext: reference_ext.into(),
        }
    }

    /// Script path for a variant
    pub fn script_for(&self, variant: &Variant) -> HarnessResult<PathBuf> {
        locate(
            &self.dir,
            &variant.family,
            variant.kind,
            variant.index,
            &self.script_ext,
        )
    }

    /// Reference output path for a script in this layout
    pub fn reference_for(&self, script: &Path) -> PathBuf {
        reference_path(script, &self.reference_ext)
    }
}

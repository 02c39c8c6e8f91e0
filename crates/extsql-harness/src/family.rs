//! Test families - named groups of numbered script variants

use crate::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How every variant of a family is verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Exit status must equal the configured success code
    Success,
    /// Exit status must differ from the configured success code
    Failure,
    /// Stdout must equal the reference file byte-for-byte
    Comparison,
}

impl Mode {
    /// Get mode name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Comparison => "comparison",
        }
    }

    /// Script kind checked by this mode
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Success => VariantKind::Success,
            Self::Failure => VariantKind::Failure,
            Self::Comparison => VariantKind::Plain,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "comparison" | "compare" => Ok(Self::Comparison),
            other => Err(format!(
                "unknown mode '{}' (expected success, failure or comparison)",
                other
            )),
        }
    }
}

/// Script file kind, which decides the filename suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Plain,
    Success,
    Failure,
}

impl VariantKind {
    /// Filename suffix inserted between family name and index
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Success => Some("success"),
            Self::Failure => Some("failure"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.suffix().unwrap_or("plain")
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_enabled() -> bool {
    true
}

fn is_enabled(enabled: &bool) -> bool {
    *enabled
}

/// A declared family of script variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestFamily {
    /// Family name, the common filename prefix (e.g., "externalSql_sqlite")
    pub name: String,
    /// Number of variants, indexed 1..=count
    pub count: u32,
    /// Verification mode
    pub mode: Mode,
    /// Families needing optional external dependencies can be switched off
    #[serde(default = "default_enabled", skip_serializing_if = "is_enabled")]
    pub enabled: bool,
    /// Reporting label only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TestFamily {
    /// Create an enabled family
    pub fn new(name: impl Into<String>, count: u32, mode: Mode) -> Self {
        Self {
            name: name.into(),
            count,
            mode,
            enabled: true,
            category: None,
        }
    }

    /// Set whether the family runs
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the reporting category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Check the declaration can be enumerated
    pub fn validate(&self) -> HarnessResult<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::invalid_variant(
                &self.name,
                "family name cannot be empty",
            ));
        }
        if self.count == 0 {
            return Err(HarnessError::invalid_variant(
                &self.name,
                "variant count must be positive",
            ));
        }
        Ok(())
    }

    /// All variants in index order
    pub fn variants(&self) -> HarnessResult<Vec<Variant>> {
        self.validate()?;
        Ok((1..=self.count)
            .map(|index| Variant {
                family: self.name.clone(),
                kind: self.mode.kind(),
                index,
            })
            .collect())
    }

    /// Display label, e.g. "externalSql_sqlite (success)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.mode)
    }
}

/// One concrete script of a family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    pub family: String,
    pub kind: VariantKind,
    pub index: u32,
}

impl Variant {
    /// Script file stem without extension
    pub fn stem(&self) -> String {
        match self.kind.suffix() {
            Some(suffix) => format!("{}_{}_{}", self.family, suffix, self.index),
            None => format!("{}_{}", self.family, self.index),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem())
    }
}

/// Ordered table of family declarations driving a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyTable {
    families: Vec<TestFamily>,
}

impl FamilyTable {
    pub fn new(families: Vec<TestFamily>) -> Self {
        Self { families }
    }

    /// The external-SQL suite: DuckDB, SQLite and (driver-dependent) ODBC
    pub fn external_sql() -> Self {
        Self::new(vec![
            TestFamily::new("externalSql_duckdb", 3, Mode::Success).with_category("sql"),
            TestFamily::new("externalSql_odbc", 1, Mode::Success)
                .with_category("sql")
                .with_enabled(false),
            TestFamily::new("externalSql_sqlite", 3, Mode::Success).with_category("sql"),
            TestFamily::new("externalSql_duckdb", 2, Mode::Failure).with_category("literals"),
            TestFamily::new("externalSql_sqlite", 2, Mode::Failure).with_category("literals"),
            TestFamily::new("externalSql_duckdb", 3, Mode::Comparison).with_category("sql"),
            TestFamily::new("externalSql_odbc", 1, Mode::Comparison)
                .with_category("sql")
                .with_enabled(false),
            TestFamily::new("externalSql_sqlite", 3, Mode::Comparison).with_category("sql"),
        ])
    }

    /// Keep families whose name contains the pattern
    pub fn filter(&self, pattern: &str) -> Self {
        Self::new(
            self.families
                .iter()
                .filter(|f| f.name.contains(pattern))
                .cloned()
                .collect(),
        )
    }

    /// Keep families of one mode
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self::new(
            self.families
                .iter()
                .filter(|f| f.mode == mode)
                .cloned()
                .collect(),
        )
    }

    /// Mark every family enabled
    pub fn enable_all(mut self) -> Self {
        for family in &mut self.families {
            family.enabled = true;
        }
        self
    }

    /// Reject invalid or duplicate (name, mode) declarations
    pub fn validate(&self) -> HarnessResult<()> {
        let mut seen = std::collections::HashSet::new();
        for family in &self.families {
            family.validate()?;
            if !seen.insert((family.name.as_str(), family.mode)) {
                return Err(HarnessError::invalid_variant(
                    &family.name,
                    format!("declared twice in {} mode", family.mode),
                ));
            }
        }
        Ok(())
    }

    pub fn families(&self) -> &[TestFamily] {
        &self.families
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestFamily> {
        self.families.iter()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Total number of variants across enabled families
    pub fn variant_count(&self) -> u64 {
        self.families
            .iter()
            .filter(|f| f.enabled)
            .map(|f| u64::from(f.count))
            .sum()
    }

    pub fn into_vec(self) -> Vec<TestFamily> {
        self.families
    }
}

impl FromIterator<TestFamily> for FamilyTable {
    fn from_iter<I: IntoIterator<Item = TestFamily>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FamilyTable {
    type Item = &'a TestFamily;
    type IntoIter = std::slice::Iter<'a, TestFamily>;

    fn into_iter(self) -> Self::IntoIter {
        self.families.iter()
    }
}

//! Per-variant outcomes and their aggregation into family verdicts

use crate::error::HarnessError;
use crate::family::{Mode, TestFamily, Variant};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of checking one variant
#[derive(Debug)]
pub enum CaseOutcome {
    Passed,
    Failed(HarnessError),
}

impl CaseOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }

    pub fn is_fail(&self) -> bool {
        !self.is_pass()
    }

    pub fn error(&self) -> Option<&HarnessError> {
        match self {
            CaseOutcome::Passed => None,
            CaseOutcome::Failed(error) => Some(error),
        }
    }
}

impl From<Result<(), HarnessError>> for CaseOutcome {
    fn from(result: Result<(), HarnessError>) -> Self {
        match result {
            Ok(()) => CaseOutcome::Passed,
            Err(error) => CaseOutcome::Failed(error),
        }
    }
}

/// A checked variant
#[derive(Debug)]
pub struct VariantReport {
    pub variant: Variant,
    /// Resolved script path
    pub script: PathBuf,
    pub outcome: CaseOutcome,
    pub duration: Duration,
}

/// Verdict for a whole family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyVerdict {
    Passed,
    Failed,
    /// Family is disabled and nothing ran
    Skipped,
}

impl FamilyVerdict {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of enumerating one family
#[derive(Debug)]
pub struct FamilyReport {
    pub family: TestFamily,
    pub verdict: FamilyVerdict,
    /// One entry per index, in index order
    pub variants: Vec<VariantReport>,
    /// Set when the declaration itself was rejected
    pub setup_error: Option<HarnessError>,
}

impl FamilyReport {
    /// Aggregate variant reports; passed iff every variant passed
    pub fn from_variants(family: TestFamily, variants: Vec<VariantReport>) -> Self {
        let verdict = if variants.iter().all(|v| v.outcome.is_pass()) {
            FamilyVerdict::Passed
        } else {
            FamilyVerdict::Failed
        };
        Self {
            family,
            verdict,
            variants,
            setup_error: None,
        }
    }

    /// Report for a disabled family
    pub fn skipped(family: TestFamily) -> Self {
        Self {
            family,
            verdict: FamilyVerdict::Skipped,
            variants: Vec::new(),
            setup_error: None,
        }
    }

    /// Report for a family whose declaration could not be enumerated
    pub fn setup_failed(family: TestFamily, error: HarnessError) -> Self {
        Self {
            family,
            verdict: FamilyVerdict::Failed,
            variants: Vec::new(),
            setup_error: Some(error),
        }
    }

    pub fn mode(&self) -> Mode {
        self.family.mode
    }

    pub fn is_passed(&self) -> bool {
        self.verdict == FamilyVerdict::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.verdict == FamilyVerdict::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.verdict == FamilyVerdict::Skipped
    }

    /// Every failing index, not just the first
    pub fn failing_indices(&self) -> Vec<u32> {
        self.failures().map(|v| v.variant.index).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &VariantReport> {
        self.variants.iter().filter(|v| v.outcome.is_fail())
    }

    pub fn passed_count(&self) -> usize {
        self.variants.iter().filter(|v| v.outcome.is_pass()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.variants.iter().filter(|v| v.outcome.is_fail()).count()
    }

    /// Sum of variant run times
    pub fn duration(&self) -> Duration {
        self.variants.iter().map(|v| v.duration).sum()
    }
}

/// Totals over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub families: usize,
    pub families_passed: usize,
    pub families_failed: usize,
    pub families_skipped: usize,
    pub variants: usize,
    pub variants_passed: usize,
    pub variants_failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn from_reports(reports: &[FamilyReport]) -> Self {
        let mut summary = RunSummary {
            families: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match report.verdict {
                FamilyVerdict::Passed => summary.families_passed += 1,
                FamilyVerdict::Failed => summary.families_failed += 1,
                FamilyVerdict::Skipped => summary.families_skipped += 1,
            }
            summary.variants += report.variants.len();
            summary.variants_passed += report.passed_count();
            summary.variants_failed += report.failed_count();
            summary.duration += report.duration();
        }
        summary
    }

    /// True when nothing failed (skipped families do not fail a run)
    pub fn is_success(&self) -> bool {
        self.families_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::StatusExpectation;
    use crate::family::VariantKind;

    fn variant_report(index: u32, outcome: CaseOutcome) -> VariantReport {
        VariantReport {
            variant: Variant {
                family: "externalSql_sqlite".to_string(),
                kind: VariantKind::Success,
                index,
            },
            script: PathBuf::from(format!("externalSql_sqlite_success_{}.daphne", index)),
            outcome,
            duration: Duration::from_millis(10),
        }
    }

    fn mismatch() -> CaseOutcome {
        CaseOutcome::Failed(HarnessError::StatusMismatch {
            expected: StatusExpectation::Exact(0),
            observed: 1,
        })
    }

    #[test]
    fn test_family_passes_when_all_variants_pass() {
        let family = TestFamily::new("externalSql_sqlite", 2, Mode::Success);
        let report = FamilyReport::from_variants(
            family,
            vec![
                variant_report(1, CaseOutcome::Passed),
                variant_report(2, CaseOutcome::Passed),
            ],
        );
        assert!(report.is_passed());
        assert!(report.failing_indices().is_empty());
        assert_eq!(report.duration(), Duration::from_millis(20));
    }

    #[test]
    fn test_family_lists_every_failing_index() {
        let family = TestFamily::new("externalSql_sqlite", 3, Mode::Success);
        let report = FamilyReport::from_variants(
            family,
            vec![
                variant_report(1, mismatch()),
                variant_report(2, CaseOutcome::Passed),
                variant_report(3, mismatch()),
            ],
        );
        assert!(report.is_failed());
        assert_eq!(report.failing_indices(), vec![1, 3]);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let passing = FamilyReport::from_variants(
            TestFamily::new("a", 1, Mode::Success),
            vec![variant_report(1, CaseOutcome::Passed)],
        );
        let failing = FamilyReport::from_variants(
            TestFamily::new("b", 1, Mode::Success),
            vec![variant_report(1, mismatch())],
        );
        let skipped = FamilyReport::skipped(TestFamily::new("c", 1, Mode::Success));

        let summary = RunSummary::from_reports(&[passing, failing, skipped]);
        assert_eq!(summary.families, 3);
        assert_eq!(summary.families_passed, 1);
        assert_eq!(summary.families_failed, 1);
        assert_eq!(summary.families_skipped, 1);
        assert_eq!(summary.variants, 2);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_skipped_does_not_fail_run() {
        let skipped = FamilyReport::skipped(TestFamily::new("c", 1, Mode::Comparison));
        let summary = RunSummary::from_reports(&[skipped]);
        assert!(summary.is_success());
    }
}

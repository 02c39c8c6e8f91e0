//! Case enumerator - drive every variant of a family through run and check
//!
//! Each family moves `Pending -> Running(i) -> {Passed, Failed}` for i in
//! 1..=count and ends once every index has a recorded outcome. A failing
//! variant never stops the family: later indices still run and are reported.

use crate::checker::{check_status, compare_output, StatusExpectation};
use crate::error::{HarnessError, HarnessResult};
use crate::family::{Mode, TestFamily, Variant};
use crate::invoker::Invoker;
use crate::locator::ScriptLayout;
use crate::report::{CaseOutcome, FamilyReport, VariantReport};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Case enumerator with configuration
pub struct CaseEnumerator {
    /// Script naming and location
    layout: ScriptLayout,
    /// Interpreter runner shared by all variants
    invoker: Invoker,
    /// Exit status that means success
    success_code: i32,
    /// Whether to run variants in parallel
    parallel: bool,
    /// Dedicated worker pool; rayon's global pool when unset
    pool: Option<rayon::ThreadPool>,
}

impl CaseEnumerator {
    /// Create a new enumerator with default settings
    pub fn new(layout: ScriptLayout, invoker: Invoker) -> Self {
        Self {
            layout,
            invoker,
            success_code: 0,
            parallel: true,
            pool: None,
        }
    }

    /// Set the exit status treated as success
    pub fn with_success_code(mut self, success_code: i32) -> Self {
        self.success_code = success_code;
        self
    }

    /// Set whether to run variants in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Bound the number of concurrently running interpreters
    pub fn with_jobs(mut self, jobs: usize) -> HarnessResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name(|i| format!("extsql-worker-{}", i))
            .build()
            .map_err(|e| HarnessError::WorkerPool(e.to_string()))?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn layout(&self) -> &ScriptLayout {
        &self.layout
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn success_code(&self) -> i32 {
        self.success_code
    }

    /// Run every variant of one family
    ///
    /// Only a rejected declaration (zero count, empty name) is an error; every
    /// per-variant failure is recorded in the report.
    pub fn run_family(&self, family: &TestFamily) -> HarnessResult<FamilyReport> {
        if !family.enabled {
            warn!(family = %family.label(), "family disabled, skipping");
            return Ok(FamilyReport::skipped(family.clone()));
        }

        let variants = family.variants()?;
        let reports: Vec<VariantReport> = self.in_pool(|| {
            if self.parallel {
                variants
                    .par_iter()
                    .map(|variant| self.run_variant(variant, family.mode))
                    .collect()
            } else {
                variants
                    .iter()
                    .map(|variant| self.run_variant(variant, family.mode))
                    .collect()
            }
        });

        let report = FamilyReport::from_variants(family.clone(), reports);
        info!(
            family = %family.label(),
            verdict = report.verdict.name(),
            passed = report.passed_count(),
            failed = report.failed_count(),
            "family finished"
        );
        Ok(report)
    }

    /// Run every family; a rejected declaration becomes a failed report
    pub fn run_all(&self, families: &[TestFamily]) -> Vec<FamilyReport> {
        let run_one = |family: &TestFamily| {
            self.run_family(family).unwrap_or_else(|error| {
                warn!(family = %family.label(), %error, "family rejected");
                FamilyReport::setup_failed(family.clone(), error)
            })
        };

        self.in_pool(|| {
            if self.parallel {
                families.par_iter().map(run_one).collect()
            } else {
                families.iter().map(run_one).collect()
            }
        })
    }

    /// Locate, run and check a single variant
    pub fn run_variant(&self, variant: &Variant, mode: Mode) -> VariantReport {
        let start = Instant::now();
        let script = match self.layout.script_for(variant) {
            Ok(script) => script,
            Err(error) => {
                return VariantReport {
                    variant: variant.clone(),
                    script: self.layout.dir.clone(),
                    outcome: CaseOutcome::Failed(error),
                    duration: start.elapsed(),
                }
            }
        };

        let outcome = CaseOutcome::from(self.check(&script, mode));
        if let CaseOutcome::Failed(error) = &outcome {
            warn!(variant = %variant, kind = error.kind(), "variant failed");
        }

        VariantReport {
            variant: variant.clone(),
            script,
            outcome,
            duration: start.elapsed(),
        }
    }

    fn check(&self, script: &Path, mode: Mode) -> HarnessResult<()> {
        if !script.is_file() {
            return Err(HarnessError::MissingScript {
                path: script.to_path_buf(),
            });
        }

        let result = self.invoker.run(script)?;
        match mode {
            Mode::Success => {
                check_status(result.status, StatusExpectation::Exact(self.success_code))
            }
            Mode::Failure => check_status(
                result.status,
                StatusExpectation::AnyFailure {
                    success: self.success_code,
                },
            ),
            Mode::Comparison => {
                compare_output(script, &self.layout.reference_ext, &result.stdout)
            }
        }
    }

    fn in_pool<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

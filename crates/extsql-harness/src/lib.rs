//! External-SQL conformance harness
//!
//! Drives an interpreter over numbered script variants and verifies each run:
//! - Script location from (family, kind, index)
//! - Interpreter invocation with timeout and cancellation
//! - Exit status checks (exact success code, or any failure)
//! - Byte-exact comparison of stdout against reference files
//! - Per-variant and per-family reporting
//!
//! # Example
//!
//! ```no_run
//! use extsql_harness::{CaseEnumerator, Invoker, Mode, ScriptLayout, TestFamily};
//!
//! let layout = ScriptLayout::new("test/api/cli/externalSQL", "daphne", "ref");
//! let invoker = Invoker::new("bin/daphne");
//! let enumerator = CaseEnumerator::new(layout, invoker);
//!
//! let family = TestFamily::new("externalSql_sqlite", 3, Mode::Success);
//! let report = enumerator.run_family(&family).unwrap();
//! assert!(report.is_passed());
//! ```

pub mod audit;
pub mod cancel;
pub mod checker;
pub mod enumerator;
pub mod error;
pub mod family;
pub mod invoker;
pub mod locator;
pub mod report;

// Re-export main types
pub use audit::{audit, FamilyAudit, LayoutAudit};
pub use cancel::CancelToken;
pub use checker::{check_status, compare_output, StatusExpectation};
pub use enumerator::CaseEnumerator;
pub use error::{HarnessError, HarnessResult};
pub use family::{FamilyTable, Mode, TestFamily, Variant, VariantKind};
pub use invoker::{ExecutionResult, Invoker};
pub use locator::{locate, reference_path, ScriptLayout};
pub use report::{CaseOutcome, FamilyReport, FamilyVerdict, RunSummary, VariantReport};

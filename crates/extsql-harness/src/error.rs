//! Harness error types
use crate::checker::{render_mismatch, StatusExpectation};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Invalid variant for family '{family}': {reason}")]
    InvalidVariant { family: String, reason: String },

    #[error("Script not found: {path}")]
    MissingScript { path: PathBuf },

    #[error("Failed to launch interpreter {interpreter}: {error}")]
    SpawnError {
        interpreter: PathBuf,
        error: std::io::Error,
    },

    #[error("Timed out after {timeout:.2?} running {path} (process killed)")]
    TimeoutError { path: PathBuf, timeout: Duration },

    #[error("Run cancelled before {path} completed")]
    Cancelled { path: PathBuf },

    #[error("Reference output not found: {path}")]
    MissingReference { path: PathBuf },

    #[error("Output of {path} differs from reference\n{}", render_mismatch(.expected, .actual))]
    OutputMismatch {
        path: PathBuf,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    #[error("Exit status mismatch: expected {expected}, observed {observed}")]
    StatusMismatch {
        expected: StatusExpectation,
        observed: i32,
    },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl HarnessError {
    /// Create an invalid variant error
    pub fn invalid_variant(family: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidVariant {
            family: family.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Short machine-readable name of the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidVariant { .. } => "invalid-variant",
            Self::MissingScript { .. } => "missing-script",
            Self::SpawnError { .. } => "spawn-error",
            Self::TimeoutError { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::MissingReference { .. } => "missing-reference",
            Self::OutputMismatch { .. } => "output-mismatch",
            Self::StatusMismatch { .. } => "status-mismatch",
            Self::WorkerPool(_) => "worker-pool",
            Self::Io { .. } => "io",
        }
    }
}

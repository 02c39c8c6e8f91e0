//! Status and output checks applied to a finished run

use crate::error::{HarnessError, HarnessResult};
use crate::locator::reference_path;
use std::fmt;
use std::path::Path;

/// Expected exit status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusExpectation {
    /// Status must equal this code
    Exact(i32),
    /// Status must be anything but the success code
    AnyFailure { success: i32 },
}

impl StatusExpectation {
    pub fn accepts(&self, observed: i32) -> bool {
        match *self {
            Self::Exact(code) => observed == code,
            Self::AnyFailure { success } => observed != success,
        }
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{}", code),
            Self::AnyFailure { success } => write!(f, "any status other than {}", success),
        }
    }
}

/// Compare an observed exit status against the expectation
pub fn check_status(observed: i32, expected: StatusExpectation) -> HarnessResult<()> {
    if expected.accepts(observed) {
        Ok(())
    } else {
        Err(HarnessError::StatusMismatch { expected, observed })
    }
}

/// Compare captured stdout against the script's reference file, byte for byte
pub fn compare_output(script: &Path, reference_ext: &str, actual: &[u8]) -> HarnessResult<()> {
    let reference = reference_path(script, reference_ext);
    let expected = match std::fs::read(&reference) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HarnessError::MissingReference { path: reference });
        }
        Err(e) => return Err(HarnessError::io(reference, e)),
    };

    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::OutputMismatch {
            path: script.to_path_buf(),
            expected,
            actual: actual.to_vec(),
        })
    }
}

/// Byte offset of the first difference, if any
pub fn first_difference(expected: &[u8], actual: &[u8]) -> Option<usize> {
    let common = expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a);
    match common {
        Some(offset) => Some(offset),
        None if expected.len() != actual.len() => Some(expected.len().min(actual.len())),
        None => None,
    }
}

/// Human-readable mismatch: where the outputs diverge, then both in full
pub(crate) fn render_mismatch(expected: &[u8], actual: &[u8]) -> String {
    let mut out = String::new();

    if let Some(offset) = first_difference(expected, actual) {
        let line = expected[..offset].iter().filter(|&&b| b == b'\n').count() + 1;
        out.push_str(&format!(
            "first difference at byte {} (line {}); expected {} bytes, got {}\n",
            offset,
            line,
            expected.len(),
            actual.len()
        ));
        // Escaped so whitespace and line-ending differences are visible
        out.push_str(&format!(
            "  expected line: {:?}\n",
            line_at(expected, line)
        ));
        out.push_str(&format!("  actual line:   {:?}\n", line_at(actual, line)));
    }

    out.push_str("--- expected\n");
    out.push_str(&String::from_utf8_lossy(expected));
    if !expected.ends_with(b"\n") {
        out.push('\n');
    }
    out.push_str("+++ actual\n");
    out.push_str(&String::from_utf8_lossy(actual));
    out
}

fn line_at(bytes: &[u8], line: usize) -> String {
    bytes
        .split_inclusive(|&b| b == b'\n')
        .nth(line - 1)
        .map(|l| String::from_utf8_lossy(l).into_owned())
        .unwrap_or_default()
}

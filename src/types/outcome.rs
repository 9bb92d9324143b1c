//! Per-file generation outcome.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::SourceFile;

/// Outcome of generating tests for one source file.
///
/// One instance per input file, created by the engine and consumed by the
/// caller. A file with zero matching definitions yields an empty but
/// successful result. `error` is set for file-level failures (unreadable,
/// unparseable, no adapter); per-definition failures merely shrink
/// `functions_tested`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub source: Option<SourceFile>,
    /// Generated test code, concatenated across definitions × test types.
    pub test_code: String,
    /// Where the tests were (or would be, in dry-run) written.
    pub test_path: Option<PathBuf>,
    /// Names of definitions a test was generated for.
    pub functions_tested: Vec<String>,
    /// File-level error, or a non-fatal validation failure annotation.
    pub error: Option<String>,
    /// Set when `error` records a validation failure rather than a
    /// generation failure; the written file is kept in that case.
    pub validation_failed: bool,
}

impl GenerationResult {
    pub fn for_file(source: &SourceFile) -> Self {
        Self {
            source: Some(source.clone()),
            ..Self::default()
        }
    }

    /// An immediate error result, used when a file cannot enter the
    /// pipeline at all.
    pub fn failed(source: &SourceFile, error: impl Into<String>) -> Self {
        Self {
            source: Some(source.clone()),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True unless a file-level error was recorded. Validation failures
    /// are annotations, not failures.
    pub fn is_success(&self) -> bool {
        self.error.is_none() || self.validation_failed
    }
}

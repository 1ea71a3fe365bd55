//! Fatal error taxonomy for per-file operations.
//!
//! Only conditions that abort work on a file live here. Recoverable
//! per-field failures accumulate in `RepairResult::diagnostics` instead,
//! so callers can tell "operation failed" from "succeeded with caveats".

use std::path::PathBuf;

/// Result type for gap-fixer operations.
pub type GapFixResult<T> = Result<T, GapFixError>;

/// Error type for gap-fixer operations. Each variant is fatal for the file
/// it occurs on; the batch loop converts them into failed `RepairResult`s
/// and continues with the next file.
#[derive(Debug, thiserror::Error)]
pub enum GapFixError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No timestamp column found: no requested name matched, no temporal column, no known candidate name")]
    NoTimestampField,

    #[error("Insufficient memory: {used_mb:.1} MB in use against a {limit_mb} MB budget")]
    InsufficientMemory { used_mb: f64, limit_mb: u64 },

    #[error("Backup failed for {path:?}: {reason}")]
    Backup { path: PathBuf, reason: String },

    #[error("Failed to load {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to write {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },
}

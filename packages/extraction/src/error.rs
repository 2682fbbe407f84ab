//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors produced while scanning a single input file.
///
/// Every variant is per-file: callers record the failure against the file
/// and continue with the remaining inputs. Nothing here aborts a job.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No registered scanner accepts this file type
    #[error("unsupported format: {content_type}")]
    UnsupportedFormat { content_type: String },

    /// A scanner accepted the file but cannot parse it
    #[error("corrupt input {path}: {reason}")]
    CorruptInput { path: String, reason: String },

    /// Reading the file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

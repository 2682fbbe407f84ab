//! Scanner trait for pluggable per-format extraction.
//!
//! A scanner advertises the file types it accepts via [`Scanner::matches`]
//! and produces discovered addresses lazily as a stream. Scans must be
//! restartable: a retried job may invoke the same scanner over the same
//! file from scratch, so implementations keep no mutable state between
//! calls.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{ScanError, ScanResult};
use crate::types::{EmailHit, FileMeta};

/// Lazy, finite stream of scan results for one file.
///
/// An `Err` item records a per-file failure; the file's earlier hits remain
/// valid and the consumer moves on to the next input.
pub type EmailStream = BoxStream<'static, Result<EmailHit, ScanError>>;

/// A format-specific email scanner.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Whether this scanner accepts the given file, judged purely on its
    /// declared metadata.
    fn matches(&self, meta: &FileMeta) -> bool;

    /// Scan a file, yielding discovered addresses lazily.
    async fn scan(&self, path: &Path, meta: &FileMeta) -> ScanResult<EmailStream>;

    /// Scanner name (for logging).
    fn name(&self) -> &'static str;
}

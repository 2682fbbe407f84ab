//! Scanner registration and selection.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ScanError, ScanResult};
use crate::scanner::{EmailStream, Scanner};
use crate::scanners::{CsvScanner, HtmlScanner, TextScanner};
use crate::types::FileMeta;

/// Ordered set of scanners with a plain-text fallback.
///
/// Selection walks the registered scanners in registration order and takes
/// the first match. When nothing matches, the fallback text scanner is used
/// for files that look like text (or declare no type at all); everything
/// else is an unsupported format.
pub struct ScannerRegistry {
    scanners: Vec<Arc<dyn Scanner>>,
    fallback: Arc<dyn Scanner>,
}

impl ScannerRegistry {
    /// Create an empty registry with the text-scanner fallback.
    pub fn new() -> Self {
        Self {
            scanners: Vec::new(),
            fallback: Arc::new(TextScanner::new()),
        }
    }

    /// Registry with the built-in scanners registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CsvScanner::new()));
        registry.register(Arc::new(HtmlScanner::new()));
        registry
    }

    /// Register a scanner. Earlier registrations win ties.
    pub fn register(&mut self, scanner: Arc<dyn Scanner>) {
        self.scanners.push(scanner);
    }

    /// Select the scanner for a file. Pure function of the file metadata.
    pub fn select(&self, meta: &FileMeta) -> ScanResult<&dyn Scanner> {
        for scanner in &self.scanners {
            if scanner.matches(meta) {
                return Ok(scanner.as_ref());
            }
        }

        if self.fallback.matches(meta) || meta.content_type.is_none() {
            return Ok(self.fallback.as_ref());
        }

        Err(ScanError::UnsupportedFormat {
            content_type: meta
                .content_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    /// Select the scanner for a file and start scanning it.
    pub async fn scan_file(&self, path: &Path, meta: &FileMeta) -> ScanResult<EmailStream> {
        let scanner = self.select(meta)?;
        debug!(file = %meta.name, scanner = scanner.name(), "scanning file");
        scanner.scan(path, meta).await
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

//! Mock implementations for consumers' tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{ScanError, ScanResult};
use crate::scanner::{EmailStream, Scanner};
use crate::types::{EmailHit, FileMeta};

/// Scripted scanner for tests.
///
/// Yields a fixed list of addresses (attributed to whatever file it is
/// asked to scan), optionally failing instead, optionally sleeping first
/// so tests can observe in-flight jobs.
#[derive(Debug, Clone, Default)]
pub struct MockScanner {
    name: &'static str,
    extensions: Vec<String>,
    addresses: Vec<String>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockScanner {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Restrict matching to one extension. Without this, everything matches.
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Add an address to yield from every scan.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    /// Make every scan fail with `CorruptInput`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Sleep before yielding anything, to simulate slow extraction.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Scanner for MockScanner {
    fn matches(&self, meta: &FileMeta) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        meta.extension()
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    async fn scan(&self, path: &Path, meta: &FileMeta) -> ScanResult<EmailStream> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = &self.failure {
            return Err(ScanError::CorruptInput {
                path: path.display().to_string(),
                reason: reason.clone(),
            });
        }

        let source = meta.name.clone();
        let hits: Vec<ScanResult<EmailHit>> = self
            .addresses
            .iter()
            .map(|address| {
                Ok(EmailHit {
                    address: address.clone(),
                    source: source.clone(),
                    context: None,
                })
            })
            .collect();

        Ok(futures::stream::iter(hits).boxed())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

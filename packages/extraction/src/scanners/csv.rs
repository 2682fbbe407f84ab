//! Delimited-text scanner with row-level provenance.

use std::path::Path;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::classify_read_error;
use crate::error::ScanResult;
use crate::pattern::find_addresses;
use crate::scanner::{EmailStream, Scanner};
use crate::types::{EmailHit, FileMeta};

/// Scanner for CSV/TSV exports.
///
/// Address matching is row-local, so no field-level parsing is needed; the
/// context hint carries the row number so results can be traced back to the
/// spreadsheet line they came from.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvScanner;

impl CsvScanner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scanner for CsvScanner {
    fn matches(&self, meta: &FileMeta) -> bool {
        match meta.content_type.as_deref() {
            Some("text/csv") | Some("text/tab-separated-values") => true,
            _ => matches!(meta.extension().as_deref(), Some("csv") | Some("tsv")),
        }
    }

    async fn scan(&self, path: &Path, meta: &FileMeta) -> ScanResult<EmailStream> {
        let file = File::open(path).await?;
        let source = meta.name.clone();
        let display = path.display().to_string();

        let stream = try_stream! {
            let mut lines = BufReader::new(file).lines();
            let mut row: u64 = 0;
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| classify_read_error(e, &display))?
            {
                row += 1;
                for m in find_addresses(&line) {
                    yield EmailHit {
                        address: m.address,
                        source: source.clone(),
                        context: Some(format!("row {}: {}", row, m.context)),
                    };
                }
            }
        };

        Ok(stream.boxed())
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

//! Plain-text scanner and registry default fallback.

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

const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "log"];

/// Line-streaming scanner for plain text.
///
/// Also serves as the registry fallback for files with no more specific
/// handler: anything that decodes as UTF-8 gets a regex pass, anything that
/// does not is reported as corrupt input.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextScanner;

impl TextScanner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scanner for TextScanner {
    fn matches(&self, meta: &FileMeta) -> bool {
        match meta.content_type.as_deref() {
            Some(ct) if ct.starts_with("text/") => true,
            Some(_) => false,
            None => meta
                .extension()
                .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str())),
        }
    }

    async fn scan(&self, path: &Path, meta: &FileMeta) -> ScanResult<EmailStream> {
        let file = File::open(path).await?;
        let source = meta.name.clone();
        let display = path.display().to_string();

        let stream = try_stream! {
            let mut lines = BufReader::new(file).lines();
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| classify_read_error(e, &display))?
            {
                for m in find_addresses(&line) {
                    yield EmailHit {
                        address: m.address,
                        source: source.clone(),
                        context: Some(m.context),
                    };
                }
            }
        };

        Ok(stream.boxed())
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use futures::TryStreamExt;
    use std::io::Write;

    fn meta_for(name: &str) -> FileMeta {
        FileMeta::new(name).sniff_content_type()
    }

    #[tokio::test]
    async fn scans_addresses_out_of_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.txt");
        std::fs::write(&path, "contact: jane@example.com\nalso JOHN@Example.COM\n").unwrap();

        let scanner = TextScanner::new();
        let stream = scanner.scan(&path, &meta_for("contacts.txt")).await.unwrap();
        let hits: Vec<_> = stream.try_collect().await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].address, "jane@example.com");
        assert_eq!(hits[1].address, "JOHN@Example.COM");
        assert_eq!(hits[0].source, "contacts.txt");
        assert!(hits[0].context.as_deref().unwrap().contains("contact:"));
    }

    #[tokio::test]
    async fn binary_content_is_corrupt_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0xff, 0xfe, 0x00, 0x80, 0xff]).unwrap();

        let scanner = TextScanner::new();
        let stream = scanner.scan(&path, &meta_for("blob.txt")).await.unwrap();
        let result: Result<Vec<_>, _> = stream.try_collect().await;

        assert!(matches!(result, Err(ScanError::CorruptInput { .. })));
    }

    #[tokio::test]
    async fn missing_file_fails_at_open() {
        let scanner = TextScanner::new();
        let result = scanner
            .scan(Path::new("/nonexistent/contacts.txt"), &meta_for("contacts.txt"))
            .await;
        assert!(matches!(result, Err(ScanError::Io(_))));
    }

    #[test]
    fn matches_text_types_and_extensions() {
        let scanner = TextScanner::new();
        assert!(scanner.matches(&FileMeta::new("a").with_content_type("text/plain")));
        assert!(scanner.matches(&FileMeta::new("notes.md")));
        assert!(!scanner.matches(&FileMeta::new("a").with_content_type("application/pdf")));
        assert!(!scanner.matches(&FileMeta::new("archive.zip")));
    }
}

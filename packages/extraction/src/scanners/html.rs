//! HTML scanner: document text plus `mailto:` links.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use scraper::{Html, Selector};

use super::classify_read_error;
use crate::error::ScanResult;
use crate::pattern::find_addresses;
use crate::scanner::{EmailStream, Scanner};
use crate::types::{EmailHit, FileMeta};

/// Scanner for HTML documents.
///
/// Addresses often live only in `mailto:` hrefs, so those are collected in
/// addition to the rendered text. The parsed DOM is not `Send`, so the file
/// is read first and parsing happens synchronously before the stream is
/// built.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlScanner;

impl HtmlScanner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scanner for HtmlScanner {
    fn matches(&self, meta: &FileMeta) -> bool {
        match meta.content_type.as_deref() {
            Some("text/html") | Some("application/xhtml+xml") => true,
            _ => matches!(meta.extension().as_deref(), Some("html") | Some("htm")),
        }
    }

    async fn scan(&self, path: &Path, meta: &FileMeta) -> ScanResult<EmailStream> {
        let display = path.display().to_string();
        let html = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| classify_read_error(e, &display))?;

        let hits = collect_hits(&html, &meta.name);
        Ok(futures::stream::iter(hits.into_iter().map(Ok)).boxed())
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

fn collect_hits(html: &str, source: &str) -> Vec<EmailHit> {
    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(target) = href.strip_prefix("mailto:") else {
                continue;
            };
            // mailto targets may carry ?subject=... query suffixes
            let target = target.split('?').next().unwrap_or(target);
            for m in find_addresses(target) {
                let label = element.text().collect::<String>().trim().to_string();
                hits.push(EmailHit {
                    address: m.address,
                    source: source.to_string(),
                    context: (!label.is_empty()).then_some(label),
                });
            }
        }
    }

    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    for m in find_addresses(&text) {
        hits.push(EmailHit {
            address: m.address,
            source: source.to_string(),
            context: Some(m.context),
        });
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn scans_text_and_mailto_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contact.html");
        std::fs::write(
            &path,
            concat!(
                "<html><body>",
                "<p>Reach us at info@example.org today.</p>",
                "<a href=\"mailto:hidden@example.org?subject=Hi\">Write us</a>",
                "<a href=\"/about\">About</a>",
                "</body></html>",
            ),
        )
        .unwrap();

        let scanner = HtmlScanner::new();
        let meta = FileMeta::new("contact.html").sniff_content_type();
        let hits: Vec<_> = scanner
            .scan(&path, &meta)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let addresses: Vec<_> = hits.iter().map(|h| h.address.as_str()).collect();
        assert!(addresses.contains(&"info@example.org"));
        assert!(addresses.contains(&"hidden@example.org"));

        let mailto = hits.iter().find(|h| h.address == "hidden@example.org").unwrap();
        assert_eq!(mailto.context.as_deref(), Some("Write us"));
    }

    #[test]
    fn matches_html_types() {
        let scanner = HtmlScanner::new();
        assert!(scanner.matches(&FileMeta::new("x").with_content_type("text/html")));
        assert!(scanner.matches(&FileMeta::new("index.htm")));
        assert!(!scanner.matches(&FileMeta::new("notes.txt")));
    }
}

//! Data types shared between scanners and their consumers.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pattern::normalize;

/// Metadata describing one input file, as declared at upload time.
///
/// Scanner selection is a pure function of this metadata; no scanner
/// inspects file contents to decide whether it applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    /// Original file name
    pub name: String,
    /// Declared or sniffed MIME type, if any
    pub content_type: Option<String>,
    /// File size in bytes
    pub size_bytes: u64,
}

impl FileMeta {
    /// Create metadata with just a file name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            size_bytes: 0,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the file size.
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Fill in the content type by sniffing the file name, unless one was
    /// already declared.
    pub fn sniff_content_type(mut self) -> Self {
        if self.content_type.is_none() {
            self.content_type = mime_guess::from_path(&self.name)
                .first_raw()
                .map(|m| m.to_string());
        }
        self
    }

    /// Lowercased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// One discovered email address with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailHit {
    /// The address exactly as it appeared
    pub address: String,
    /// Name of the file it was found in
    pub source: String,
    /// Surrounding-text hint, when the scanner can provide one
    pub context: Option<String>,
}

/// Occurrences of one address within one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Source file name
    pub file: String,
    /// How many times the address appeared in this file
    pub occurrences: u64,
    /// Context hint from the first occurrence
    pub context: Option<String>,
}

/// One deduplicated address with every source it was seen in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEntry {
    /// Normalized (lowercased) address
    pub address: String,
    /// Source files, in first-seen order
    pub sources: Vec<SourceRecord>,
}

impl EmailEntry {
    /// Total occurrences across all source files.
    pub fn total_occurrences(&self) -> u64 {
        self.sources.iter().map(|s| s.occurrences).sum()
    }
}

/// Aggregated scan results for one job.
///
/// Addresses are deduplicated case-insensitively; every source occurrence
/// is still tracked. Insertion order is preserved so repeated runs over the
/// same inputs produce identical artifacts.
#[derive(Debug, Default, Clone)]
pub struct ResultSet {
    entries: IndexMap<String, EmailEntry>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one hit into the set.
    pub fn absorb(&mut self, hit: EmailHit) {
        let key = normalize(&hit.address);
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| EmailEntry {
                address: key,
                sources: Vec::new(),
            });

        match entry.sources.iter_mut().find(|s| s.file == hit.source) {
            Some(record) => record.occurrences += 1,
            None => entry.sources.push(SourceRecord {
                file: hit.source,
                occurrences: 1,
                context: hit.context,
            }),
        }
    }

    /// Number of distinct addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total occurrences across all addresses and sources.
    pub fn total_occurrences(&self) -> u64 {
        self.entries.values().map(|e| e.total_occurrences()).sum()
    }

    /// Look up an entry by (any-case) address.
    pub fn get(&self, address: &str) -> Option<&EmailEntry> {
        self.entries.get(&normalize(address))
    }

    /// Iterate entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = &EmailEntry> {
        self.entries.values()
    }

    /// Consume the set, yielding entries in first-seen order.
    pub fn into_entries(self) -> Vec<EmailEntry> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(address: &str, source: &str) -> EmailHit {
        EmailHit {
            address: address.to_string(),
            source: source.to_string(),
            context: None,
        }
    }

    #[test]
    fn meta_extension_is_lowercased() {
        let meta = FileMeta::new("Contacts.CSV");
        assert_eq!(meta.extension().as_deref(), Some("csv"));
    }

    #[test]
    fn meta_sniffs_content_type_from_name() {
        let meta = FileMeta::new("page.html").sniff_content_type();
        assert_eq!(meta.content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn sniff_keeps_declared_content_type() {
        let meta = FileMeta::new("page.html")
            .with_content_type("text/plain")
            .sniff_content_type();
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn absorb_dedups_case_insensitively_across_files() {
        let mut set = ResultSet::new();
        set.absorb(hit("A@X.com", "one.txt"));
        set.absorb(hit("a@x.com", "two.txt"));

        assert_eq!(set.len(), 1);
        let entry = set.get("a@x.com").expect("entry");
        assert_eq!(entry.address, "a@x.com");
        let files: Vec<_> = entry.sources.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(files, vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn absorb_counts_repeat_occurrences_per_file() {
        let mut set = ResultSet::new();
        set.absorb(hit("a@x.com", "one.txt"));
        set.absorb(hit("A@X.COM", "one.txt"));
        set.absorb(hit("a@x.com", "two.txt"));

        let entry = set.get("a@x.com").expect("entry");
        assert_eq!(entry.total_occurrences(), 3);
        assert_eq!(entry.sources[0].occurrences, 2);
        assert_eq!(entry.sources[1].occurrences, 1);
    }

    #[test]
    fn entries_keep_first_seen_order() {
        let mut set = ResultSet::new();
        set.absorb(hit("jane@example.com", "a.txt"));
        set.absorb(hit("john@example.com", "a.txt"));
        set.absorb(hit("JANE@example.com", "b.txt"));

        let order: Vec<_> = set.entries().map(|e| e.address.as_str()).collect();
        assert_eq!(order, vec!["jane@example.com", "john@example.com"]);
    }

    #[test]
    fn first_context_is_kept_per_source() {
        let mut set = ResultSet::new();
        set.absorb(EmailHit {
            address: "a@x.com".into(),
            source: "one.txt".into(),
            context: Some("first".into()),
        });
        set.absorb(EmailHit {
            address: "a@x.com".into(),
            source: "one.txt".into(),
            context: Some("second".into()),
        });

        let entry = set.get("a@x.com").expect("entry");
        assert_eq!(entry.sources[0].context.as_deref(), Some("first"));
    }
}

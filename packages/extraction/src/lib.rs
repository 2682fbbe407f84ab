//! Email extraction over uploaded documents.
//!
//! Each supported file format gets a [`Scanner`]: a handler that advertises
//! the MIME types and extensions it accepts and yields discovered addresses
//! lazily, with provenance. The [`ScannerRegistry`] picks the first handler
//! matching a file's metadata, falling back to a plain-text regex scan.
//! [`ResultSet`] folds hits from every file of a job into a deduplicated,
//! insertion-ordered set that tracks every source occurrence.
//!
//! Scan failures are deliberately small-scoped: a corrupt or unsupported
//! file is reported and skipped, never failing the sibling files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use extraction::{FileMeta, ResultSet, ScannerRegistry};
//!
//! let registry = ScannerRegistry::with_defaults();
//! let meta = FileMeta::new("contacts.csv").sniff_content_type();
//!
//! let mut results = ResultSet::new();
//! let mut stream = registry.scan_file(path, &meta).await?;
//! while let Some(hit) = stream.next().await {
//!     results.absorb(hit?);
//! }
//! ```

pub mod error;
pub mod pattern;
pub mod registry;
pub mod scanner;
pub mod scanners;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use error::{ScanError, ScanResult};
pub use pattern::{find_addresses, normalize, AddressMatch};
pub use registry::ScannerRegistry;
pub use scanner::{EmailStream, Scanner};
pub use scanners::{CsvScanner, HtmlScanner, TextScanner};
pub use types::{EmailEntry, EmailHit, FileMeta, ResultSet, SourceRecord};

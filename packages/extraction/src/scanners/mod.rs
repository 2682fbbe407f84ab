//! Built-in scanner implementations.

mod csv;
mod html;
mod text;

pub use csv::CsvScanner;
pub use html::HtmlScanner;
pub use text::TextScanner;

use crate::error::ScanError;

/// Map a read error on a text-like file to the scan taxonomy.
///
/// Invalid UTF-8 means the file is not the text it claims to be.
pub(crate) fn classify_read_error(err: std::io::Error, path: &str) -> ScanError {
    if err.kind() == std::io::ErrorKind::InvalidData {
        ScanError::CorruptInput {
            path: path.to_string(),
            reason: "not valid UTF-8 text".to_string(),
        }
    } else {
        ScanError::Io(err)
    }
}

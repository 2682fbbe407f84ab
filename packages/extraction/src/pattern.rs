//! Email address matching against raw text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Email pattern - RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b"
    ).unwrap();
}

/// How many bytes of surrounding text to keep as a context hint, per side.
const CONTEXT_WINDOW: usize = 80;

/// A single address match with its surrounding-text hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMatch {
    /// The address exactly as it appeared in the text
    pub address: String,
    /// Trimmed slice of the text around the match
    pub context: String,
}

/// Find every email address in `text`, with a context hint for each.
pub fn find_addresses(text: &str) -> Vec<AddressMatch> {
    EMAIL_REGEX
        .find_iter(text)
        .map(|m| AddressMatch {
            address: m.as_str().to_string(),
            context: context_hint(text, m.start(), m.end()),
        })
        .collect()
}

/// Normalize an address for deduplication.
///
/// Addresses are treated as fully case-insensitive; the local part is
/// case-insensitive in practice for every mainstream provider.
pub fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

fn context_hint(text: &str, start: usize, end: usize) -> String {
    let mut lo = start.saturating_sub(CONTEXT_WINDOW);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + CONTEXT_WINDOW).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    text[lo..hi].trim().to_string()
}

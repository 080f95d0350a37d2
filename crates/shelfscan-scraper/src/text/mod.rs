//! Text-blob extraction.
//!
//! Pass A ([`structured`]) matches a fixed card grammar and, when it finds
//! anything, is the only pass that runs. Pass B ([`heuristic`]) scans lines
//! for name/category pairs and is used otherwise.

mod heuristic;
mod structured;

use regex::Regex;
use shelfscan_core::CanonicalRecord;

use crate::dedup::dedup;

/// Extracts canonical, deduplicated records from a page's text.
#[must_use]
pub fn extract_from_text(blob: &str) -> Vec<CanonicalRecord> {
    let cards = structured::parse_cards(blob);
    if !cards.is_empty() {
        tracing::debug!(records = cards.len(), "structured card pass matched");
        return dedup(cards);
    }

    let scanned = heuristic::scan_lines(blob);
    tracing::debug!(records = scanned.len(), "fell back to line-scan pass");
    dedup(scanned)
}

/// Drops the page-chrome header that runs from `opening_phrase` through a
/// "Showing N of M products" line, returning the text after it.
///
/// The blob is returned unchanged when no such header is present.
#[must_use]
pub fn strip_chrome_header<'a>(blob: &'a str, opening_phrase: &str) -> &'a str {
    let pattern = format!(
        r"(?is){}.*?Showing\s*[\d,\s\-–]+of\s*[\d,]+\s*products",
        regex::escape(opening_phrase)
    );
    let Ok(header) = Regex::new(&pattern) else {
        return blob;
    };
    match header.find(blob) {
        Some(found) => blob[found.end()..].trim_start(),
        None => blob,
    }
}

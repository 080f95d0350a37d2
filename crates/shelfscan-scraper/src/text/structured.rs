//! Pass A: fixed-grammar card segments.
//!
//! A card is a name line, a type line, a blank line, then `ID:` with its
//! digits and the labels `Shade:`, `Cost:`, `Manufacturer:`, `SKU:`,
//! `Composition:` each followed by their value on the next line, closing
//! with `Updated:` and a date. Any deviation from that order means the card
//! is not matched here.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use shelfscan_core::{CanonicalRecord, ProductId};

static CARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?mi)^(?P<name>\S[^\n]*?)[ \t]*\n",
        r"(?P<type>[^\n]*\S)[ \t]*\n",
        r"[ \t]*\n",
        r"ID:[ \t]*(?P<id>\d+)\s*\n",
        r"\s*Shade:\s*\n(?P<shade>[^\n]*\S)\s*\n",
        r"Cost:\s*\n(?P<cost>\$[\d,.]+)\s*\n",
        r"Manufacturer:\s*\n(?P<manufacturer>[^\n]*\S)\s*\n",
        r"SKU:\s*\n(?P<sku>[^\n]*\S)\s*\n",
        r"Composition:\s*\n(?P<composition>[^\n]*\S)\s*\n",
        r"Updated:[ \t]*(?P<updated>[\d/]+)",
    ))
    .expect("valid card regex")
});

/// Every well-formed card in `blob`, in order of appearance.
pub(super) fn parse_cards(blob: &str) -> Vec<CanonicalRecord> {
    CARD_RE.captures_iter(blob).map(|caps| record(&caps)).collect()
}

fn record(caps: &Captures<'_>) -> CanonicalRecord {
    let field = |name: &str| {
        caps.name(name)
            .map_or("", |m| m.as_str())
            .trim()
            .to_owned()
    };
    CanonicalRecord {
        product_name: field("name"),
        product_type: field("type"),
        id: ProductId::from_raw(&field("id")),
        shade: field("shade"),
        cost: field("cost"),
        manufacturer: field("manufacturer"),
        sku: field("sku"),
        composition: field("composition"),
        updated: field("updated"),
    }
}

//! Pass B: line-scan fallback for card layouts the fixed grammar misses.

use std::sync::LazyLock;

use regex::Regex;
use shelfscan_core::{CanonicalRecord, ProductId};

/// Lowercased category lines that mark the line above as a product name.
const CATEGORIES: &[&str] = &[
    "beauty",
    "automotive",
    "toys",
    "books",
    "home & kitchen",
    "garden",
    "office",
    "health",
    "clothing",
    "electronics",
    "home",
    "kitchen",
];

/// Page chrome that can sit directly above a category-looking line.
const NOISE_PHRASES: &[&str] = &[
    "product inventory",
    "candidate",
    "instructions",
    "submit solution",
    "sign out",
    "product dashboard",
    "assessment id",
    "showing",
    "layout:",
];

/// Lines inspected after the name/type pair, not counting value lines
/// consumed by an empty label.
const SCAN_WINDOW: usize = 10;

static SKU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,4}-\d{3,}-\d+").expect("valid sku regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Id,
    Shade,
    Cost,
    Manufacturer,
    Sku,
    Composition,
    Updated,
}

impl Label {
    fn detect(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        [
            ("id:", Self::Id),
            ("shade", Self::Shade),
            ("cost", Self::Cost),
            ("manufacturer", Self::Manufacturer),
            ("sku", Self::Sku),
            ("composition", Self::Composition),
            ("updated", Self::Updated),
        ]
        .into_iter()
        .find_map(|(prefix, label)| lower.starts_with(prefix).then_some(label))
    }
}

/// A record being filled in while its card's lines are scanned.
#[derive(Debug)]
struct CardAccumulator {
    record: CanonicalRecord,
}

impl CardAccumulator {
    fn new(name: &str, product_type: &str) -> Self {
        Self {
            record: CanonicalRecord {
                product_name: name.to_owned(),
                product_type: product_type.to_owned(),
                ..CanonicalRecord::default()
            },
        }
    }

    fn set(&mut self, label: Label, value: &str) {
        let value = value.trim();
        match label {
            Label::Id => self.record.id = ProductId::from_raw(value),
            Label::Shade => value.clone_into(&mut self.record.shade),
            Label::Cost => value.clone_into(&mut self.record.cost),
            Label::Manufacturer => value.clone_into(&mut self.record.manufacturer),
            Label::Sku => value.clone_into(&mut self.record.sku),
            Label::Composition => value.clone_into(&mut self.record.composition),
            Label::Updated => value.clone_into(&mut self.record.updated),
        }
    }

    fn observe_unlabeled(&mut self, line: &str) {
        if self.record.cost.is_empty() && line.contains('$') {
            line.clone_into(&mut self.record.cost);
        }
        if self.record.sku.is_empty() && SKU_RE.is_match(line) {
            line.clone_into(&mut self.record.sku);
        }
    }

    fn finish(mut self) -> CanonicalRecord {
        self.record.trim_fields();
        self.record
    }
}

/// Scans `blob` line by line for name/category pairs and the labeled lines
/// that follow each of them.
pub(super) fn scan_lines(blob: &str) -> Vec<CanonicalRecord> {
    let lines: Vec<&str> = blob
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut records = Vec::new();
    let mut i = 0;
    while i + 1 < lines.len() {
        if !is_boundary(&lines, i) {
            i += 1;
            continue;
        }

        let mut card = CardAccumulator::new(lines[i], lines[i + 1]);
        let mut j = i + 2;
        let mut inspected = 0;
        while j < lines.len() && inspected < SCAN_WINDOW && !is_boundary(&lines, j) {
            let line = lines[j];
            inspected += 1;
            j += 1;
            match Label::detect(line) {
                Some(label) => {
                    let inline = line.split_once(':').map_or("", |(_, rest)| rest.trim());
                    if !inline.is_empty() {
                        card.set(label, inline);
                    } else if let Some(next) = lines
                        .get(j)
                        .filter(|next| Label::detect(next).is_none() && !is_boundary(&lines, j))
                    {
                        card.set(label, next);
                        j += 1;
                    }
                }
                None => card.observe_unlabeled(line),
            }
        }

        records.push(card.finish());
        i = j;
    }
    records
}

/// Line `i` names a product when line `i + 1` is a known category and line
/// `i` is not page chrome.
fn is_boundary(lines: &[&str], i: usize) -> bool {
    let (Some(name), Some(category)) = (lines.get(i), lines.get(i + 1)) else {
        return false;
    };
    let category = category.to_lowercase();
    let name = name.to_lowercase();
    CATEGORIES.contains(&category.as_str())
        && !NOISE_PHRASES.iter().any(|phrase| name.contains(phrase))
}

//! First-seen-wins deduplication by [`IdentityKey`].

use std::collections::HashSet;

use shelfscan_core::{CanonicalRecord, IdentityKey};

/// Drops every record whose identity key was already seen, keeping the
/// original order of the survivors.
#[must_use]
pub fn dedup(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let kept: Vec<CanonicalRecord> = records
        .into_iter()
        .filter(|record| seen.insert(IdentityKey::of(record)))
        .collect();

    if kept.len() < before {
        tracing::debug!(before, after = kept.len(), "dropped duplicate records");
    }
    kept
}

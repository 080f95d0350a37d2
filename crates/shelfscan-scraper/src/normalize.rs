//! Mapping of arbitrary page field names onto [`CanonicalRecord`].
//!
//! Each canonical field has an ordered alias list. Lookup compares trimmed,
//! lowercased keys for an exact alias match first (aliases in priority
//! order), then falls back to substring containment in the same order.

use shelfscan_core::{CanonicalRecord, ProductId, RawRow};

const PRODUCT_NAME: &[&str] = &["product_name", "product name", "name", "product", "title"];
const TYPE: &[&str] = &["type", "category"];
const ID: &[&str] = &["id"];
const SHADE: &[&str] = &["shade", "color"];
const COST: &[&str] = &["cost", "price"];
const MANUFACTURER: &[&str] = &["manufacturer", "maker", "brand"];
const SKU: &[&str] = &["sku"];
const COMPOSITION: &[&str] = &["composition", "material"];
const UPDATED: &[&str] = &["updated", "last updated", "modified"];

/// Normalizes a raw row into the nine-field canonical record.
///
/// Missing fields become empty strings. `id` becomes numeric when its value
/// is all digits; no other field is coerced.
#[must_use]
pub fn normalize(row: &RawRow) -> CanonicalRecord {
    let field = |aliases: &[&str]| lookup(row, aliases).trim().to_owned();

    CanonicalRecord {
        product_name: field(PRODUCT_NAME),
        product_type: field(TYPE),
        id: ProductId::from_raw(lookup(row, ID)),
        shade: field(SHADE),
        cost: field(COST),
        manufacturer: field(MANUFACTURER),
        sku: field(SKU),
        composition: field(COMPOSITION),
        updated: field(UPDATED),
    }
}

/// Resolves the first alias that matches a key of `row`, returning `""`
/// when none does.
fn lookup<'a>(row: &'a RawRow, aliases: &[&str]) -> &'a str {
    let keys: Vec<(String, &str)> = row
        .iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect();

    let exact = aliases
        .iter()
        .find_map(|alias| keys.iter().find(|(k, _)| k.as_str() == *alias));
    if let Some((_, value)) = exact {
        return *value;
    }

    aliases
        .iter()
        .find_map(|alias| keys.iter().find(|(k, _)| k.contains(*alias)))
        .map_or("", |(_, value)| *value)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

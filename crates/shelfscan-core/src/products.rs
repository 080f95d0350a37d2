use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Output field names, in serialization order.
pub const CANONICAL_FIELDS: [&str; 9] = [
    "product_name",
    "type",
    "id",
    "shade",
    "cost",
    "manufacturer",
    "sku",
    "composition",
    "updated",
];

/// A product record in the fixed nine-field output shape.
///
/// Every string field is whitespace-trimmed. `cost` and `updated` are kept
/// exactly as the page rendered them (currency symbols, locale dates).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(default)]
    pub product_name: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    #[serde(default)]
    pub id: ProductId,
    #[serde(default)]
    pub shade: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub composition: String,
    #[serde(default)]
    pub updated: String,
}

impl CanonicalRecord {
    /// Returns the record as a [`RawRow`] keyed by the canonical field names.
    #[must_use]
    pub fn to_raw_row(&self) -> RawRow {
        let mut row = RawRow::new();
        row.insert("product_name", &self.product_name);
        row.insert("type", &self.product_type);
        row.insert("id", self.id.to_string());
        row.insert("shade", &self.shade);
        row.insert("cost", &self.cost);
        row.insert("manufacturer", &self.manufacturer);
        row.insert("sku", &self.sku);
        row.insert("composition", &self.composition);
        row.insert("updated", &self.updated);
        row
    }

    /// Trims every string field in place.
    pub fn trim_fields(&mut self) {
        for field in [
            &mut self.product_name,
            &mut self.product_type,
            &mut self.shade,
            &mut self.cost,
            &mut self.manufacturer,
            &mut self.sku,
            &mut self.composition,
            &mut self.updated,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_owned();
            }
        }
        if let ProductId::Raw(raw) = &self.id {
            self.id = ProductId::from_raw(raw);
        }
    }
}

/// The product identifier: numeric when the page showed only digits,
/// otherwise the original text, or nothing at all.
///
/// Serializes `Numeric` as a JSON number and `Raw`/`Absent` as a string
/// (`Absent` becomes `""`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ProductId {
    Numeric(i64),
    Raw(String),
    #[default]
    Absent,
}

impl ProductId {
    /// Coerces page text into an identifier.
    ///
    /// Trimmed all-ASCII-digit text becomes `Numeric` (falling back to `Raw`
    /// if it overflows `i64`); other non-empty text stays `Raw`; empty text is
    /// `Absent`.
    #[must_use]
    pub fn from_raw(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::Absent;
        }
        if value.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = value.parse::<i64>() {
                return Self::Numeric(n);
            }
        }
        Self::Raw(value.to_owned())
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Raw(s) => f.write_str(s),
            Self::Absent => Ok(()),
        }
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numeric(n) => serializer.serialize_i64(*n),
            Self::Raw(s) => serializer.serialize_str(s),
            Self::Absent => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(i64),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(n) => Self::Numeric(n),
            Wire::Text(s) if s.trim().is_empty() => Self::Absent,
            Wire::Text(s) => Self::Raw(s.trim().to_owned()),
        })
    }
}

/// An unnormalized field-name → value mapping as observed on the page.
///
/// Keys keep their first-seen position; inserting an existing key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    entries: Vec<(String, String)>,
}

impl RawRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Deduplication key: SKU if present, else the identifier, else the
/// `(product_name, type)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Sku(String),
    Id(String),
    NameType(String, String),
}

impl IdentityKey {
    #[must_use]
    pub fn of(record: &CanonicalRecord) -> Self {
        if !record.sku.is_empty() {
            return Self::Sku(record.sku.clone());
        }
        if !record.id.is_absent() {
            return Self::Id(record.id.to_string());
        }
        Self::NameType(record.product_name.clone(), record.product_type.clone())
    }
}

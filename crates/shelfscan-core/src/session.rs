//! Persisted browser session state (cookies + per-origin storage) and the
//! merge that lets repeated runs accumulate it.
//!
//! The on-disk shape is `{"cookies": [...], "origins": [...]}`. Only the
//! identity fields are interpreted; every other field an entry carries is
//! preserved verbatim.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::SessionError;

/// A stored cookie, identified by `(name, domain, path)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieEntry {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CookieEntry {
    #[must_use]
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.name, &self.domain, &self.path)
    }
}

/// Storage captured for one origin, identified by the origin string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginEntry {
    pub origin: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStateSnapshot {
    #[serde(default)]
    pub cookies: Vec<CookieEntry>,
    #[serde(default)]
    pub origins: Vec<OriginEntry>,
}

/// Merges a freshly captured snapshot into the previously persisted one.
///
/// Entries sharing an identity key are replaced by the fresh entry; entries
/// only present in `previous` are kept. Output order is previous-first
/// (replacements keep the previous position), then fresh-only entries in
/// their captured order.
#[must_use]
pub fn merge(
    previous: Option<StorageStateSnapshot>,
    fresh: StorageStateSnapshot,
) -> StorageStateSnapshot {
    let previous = previous.unwrap_or_default();

    let cookies = merge_by_key(previous.cookies, fresh.cookies, |c| {
        let (name, domain, path) = c.key();
        (name.to_owned(), domain.to_owned(), path.to_owned())
    });
    let origins = merge_by_key(previous.origins, fresh.origins, |o| o.origin.clone());

    StorageStateSnapshot { cookies, origins }
}

fn merge_by_key<T, K, F>(previous: Vec<T>, fresh: Vec<T>, key: F) -> Vec<T>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut merged: Vec<T> = Vec::with_capacity(previous.len() + fresh.len());
    let mut index: HashMap<K, usize> = HashMap::new();

    for entry in previous.into_iter().chain(fresh) {
        let k = key(&entry);
        if let Some(&slot) = index.get(&k) {
            merged[slot] = entry;
        } else {
            index.insert(k, merged.len());
            merged.push(entry);
        }
    }
    merged
}

/// Reads a persisted snapshot.
///
/// Returns `None` when the file is missing, unreadable, or not a valid
/// snapshot; a corrupt file is logged and otherwise treated as absent.
#[must_use]
pub fn load_snapshot(path: &Path) -> Option<StorageStateSnapshot> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read session state");
            return None;
        }
    };

    match serde_json::from_str::<StorageStateSnapshot>(&content) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt session state");
            None
        }
    }
}

/// Merges `fresh` into whatever is persisted at `path` and writes the result
/// back as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`SessionError::Serialize`] if the snapshot cannot be encoded, or
/// [`SessionError::Io`] if the file (or its parent directory) cannot be
/// written.
pub fn merge_and_persist(
    path: &Path,
    fresh: StorageStateSnapshot,
) -> Result<StorageStateSnapshot, SessionError> {
    let merged = merge(load_snapshot(path), fresh);
    let body = serde_json::to_string_pretty(&merged)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SessionError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, body).map_err(|e| SessionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    tracing::debug!(
        path = %path.display(),
        cookies = merged.cookies.len(),
        origins = merged.origins.len(),
        "persisted merged session state"
    );
    Ok(merged)
}

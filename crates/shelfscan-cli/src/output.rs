use std::path::Path;

use anyhow::Context as _;
use shelfscan_core::CanonicalRecord;

/// Writes `records` to `path` as a pretty-printed JSON array, creating
/// parent directories as needed.
pub fn write_records(path: &Path, records: &[CanonicalRecord]) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(records).context("failed to encode records")?;
    write_file(path, &body)?;
    tracing::info!(path = %path.display(), records = records.len(), "wrote products");
    Ok(())
}

pub fn write_file(path: &Path, body: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

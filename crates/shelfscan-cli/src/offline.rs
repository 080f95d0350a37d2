//! Commands that work on saved files without a browser.

use std::path::Path;

use anyhow::Context as _;
use shelfscan_core::{CanonicalRecord, StorageStateSnapshot};
use shelfscan_scraper::{extract_from_text, strip_chrome_header};

use crate::output;

/// Runs header stripping and the text-blob strategy over saved page text.
pub(crate) fn parse_text(blob: &str, chrome_header_start: &str) -> Vec<CanonicalRecord> {
    extract_from_text(strip_chrome_header(blob, chrome_header_start))
}

/// `parse-text`: prints the records as JSON, or writes them to `output_path`.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output cannot be
/// written.
pub(crate) fn run_parse_text(
    input: &Path,
    output_path: Option<&Path>,
    chrome_header_start: &str,
) -> anyhow::Result<()> {
    let blob = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let records = parse_text(&blob, chrome_header_start);
    tracing::info!(input = %input.display(), records = records.len(), "parsed page text");

    match output_path {
        Some(path) => output::write_records(path, &records),
        None => {
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<StorageStateSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a session state file", path.display()))
}

/// `merge-state`: merges two snapshot files, `fresh` winning on conflicts.
///
/// A missing `previous` file is treated as an empty snapshot; a missing or
/// malformed `fresh` file is an error.
///
/// # Errors
///
/// Returns an error if `fresh` cannot be read or parsed, or the merged
/// snapshot cannot be written.
pub(crate) fn run_merge_state(
    previous: &Path,
    fresh: &Path,
    output_path: Option<&Path>,
) -> anyhow::Result<()> {
    let fresh = read_snapshot(fresh)?;
    let previous = shelfscan_core::load_snapshot(previous);
    let merged = shelfscan_core::merge(previous, fresh);
    let body = serde_json::to_string_pretty(&merged)?;

    match output_path {
        Some(path) => {
            output::write_file(path, &body)?;
            tracing::info!(
                path = %path.display(),
                cookies = merged.cookies.len(),
                origins = merged.origins.len(),
                "wrote merged session state"
            );
        }
        None => println!("{body}"),
    }
    Ok(())
}

//! The slice of browser automation the extraction engine depends on.
//!
//! Implementations wrap a live browser page; tests use scripted in-memory
//! pages. Patterns are CSS selectors except for [`PageSurface::trigger_by_text`],
//! whose pattern is a case-insensitive regular expression over visible text.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::SurfaceError;

/// A located DOM region (table, card, link) on the page.
#[async_trait]
pub trait RegionHandle: Send + Sync + Sized {
    /// Rendered text of the region.
    async fn visible_text(&self) -> Result<String, SurfaceError>;

    /// Number of descendants matching `child_pattern`.
    async fn count(&self, child_pattern: &str) -> Result<usize, SurfaceError>;

    /// Scrolls the region itself to its maximum extent (infinite-scroll
    /// containers load more rows this way).
    async fn scroll_into_max_extent(&self) -> Result<(), SurfaceError>;

    /// Text content of every descendant matching `child_pattern`, in
    /// document order.
    async fn child_texts(&self, child_pattern: &str) -> Result<Vec<String>, SurfaceError>;

    /// Handles for every descendant matching `child_pattern`, in document
    /// order.
    async fn children(&self, child_pattern: &str) -> Result<Vec<Self>, SurfaceError>;

    async fn click(&self, timeout: Duration) -> Result<(), SurfaceError>;
}

/// A single browser page, driven one action at a time.
#[async_trait]
pub trait PageSurface: Send + Sync {
    type Region: RegionHandle;

    /// Regions matching `pattern`, optionally kept only when their visible
    /// text matches `text_filter`.
    async fn find_regions(
        &self,
        pattern: &str,
        text_filter: Option<&Regex>,
    ) -> Result<Vec<Self::Region>, SurfaceError>;

    /// Activates the first visible element whose text matches `pattern`,
    /// trying role-based, text-based, then generic-selector lookup. Returns
    /// `false` when nothing could be activated within `timeout`.
    async fn trigger_by_text(&self, pattern: &str, timeout: Duration) -> bool;

    /// Waits until no network or DOM activity is observed.
    async fn wait_for_quiescence(&self, timeout: Duration) -> Result<(), SurfaceError>;

    /// Rendered text of the whole page body.
    async fn visible_text(&self) -> Result<String, SurfaceError>;

    /// Number of elements on the page matching `pattern`.
    async fn count(&self, pattern: &str) -> Result<usize, SurfaceError>;

    /// Scrolls the window to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<(), SurfaceError>;
}

/// One "try this label" attempt in an ordered fallback list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionCandidate {
    pub label: &'static str,
    pub timeout: Duration,
}

impl ActionCandidate {
    #[must_use]
    pub const fn new(label: &'static str, timeout: Duration) -> Self {
        Self { label, timeout }
    }
}

/// Tries each candidate in order; the first one the page activates wins.
///
/// Labels are matched literally (regex metacharacters are escaped).
pub async fn trigger_first<P: PageSurface + ?Sized>(
    page: &P,
    candidates: &[ActionCandidate],
) -> Option<ActionCandidate> {
    for candidate in candidates {
        if page
            .trigger_by_text(&regex::escape(candidate.label), candidate.timeout)
            .await
        {
            tracing::debug!(label = candidate.label, "triggered action");
            return Some(*candidate);
        }
    }
    None
}

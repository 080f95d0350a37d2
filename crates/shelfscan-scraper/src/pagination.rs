//! Pagination / infinite-scroll convergence.
//!
//! Pages reveal their rows incrementally and never say how many pages there
//! are. The loop keeps asking for more (next-page action, pagination link,
//! or scroll) and stops on whichever signal fires first:
//!
//! - the row count meets the total declared in the page chrome ("of 2,850"),
//! - the row count stays unchanged for `stable_threshold` iterations,
//! - the time budget runs out (partial data, not an error).

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use crate::surface::{trigger_first, ActionCandidate, PageSurface, RegionHandle};

/// Labels of controls that load the next page or more rows, in try order.
pub const NEXT_PAGE_LABELS: &[&str] = &["Next", ">", "»", "→", "More", "Load more"];

/// Anchors inside common pagination widgets.
pub const PAGINATION_LINKS: &str =
    "ul.pagination a, nav[aria-label*='pagination'] a, .pagination a";

static NEXT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(Next|>|»|→)\s*$").expect("valid next-link regex")
});

static EXPECTED_TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)of\s+([0-9,]{2,})").expect("valid total regex"));

/// Parses the declared dataset size from chrome text such as
/// `"Showing 1-20 of 2,850"`.
///
/// Returns `None` when no total is declared or it is zero.
#[must_use]
pub fn parse_expected_total(text: &str) -> Option<usize> {
    let caps = EXPECTED_TOTAL_RE.captures(text)?;
    let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse::<usize>().ok().filter(|total| *total > 0)
}

/// Tunables for [`Convergence::run`].
#[derive(Debug, Clone)]
pub struct ConvergenceConfig {
    /// Overall wall-clock budget; the loop returns partial data when spent.
    pub budget: Duration,
    /// Consecutive no-growth iterations that count as converged.
    pub stable_threshold: u32,
    /// Pause after each action so the UI can render.
    pub settle_pause: Duration,
    pub quiescence_timeout: Duration,
    /// Per-label timeout for next-page actions.
    pub action_timeout: Duration,
    pub link_click_timeout: Duration,
    /// Row pattern counted inside the table region (or the page).
    pub row_pattern: String,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(120),
            stable_threshold: 3,
            settle_pause: Duration::from_millis(600),
            quiescence_timeout: Duration::from_secs(3),
            action_timeout: Duration::from_millis(800),
            link_click_timeout: Duration::from_secs(1),
            row_pattern: "tbody tr".to_owned(),
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Stable,
    TotalReached,
    TimedOut,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stable => "stable",
            Self::TotalReached => "total-reached",
            Self::TimedOut => "timed-out",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceOutcome {
    pub terminal: Terminal,
    /// Row count at exit.
    pub rows: usize,
    pub iterations: u32,
    pub elapsed: Duration,
}

/// Per-run loop state; created at entry and dropped at exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceState {
    pub last_observed: Option<usize>,
    pub stable_iterations: u32,
    pub expected_total: Option<usize>,
}

impl ConvergenceState {
    #[must_use]
    pub fn new(expected_total: Option<usize>) -> Self {
        Self {
            last_observed: None,
            stable_iterations: 0,
            expected_total,
        }
    }

    /// Records the row count measured after an action and reports whether
    /// that makes the loop terminal.
    pub fn observe(&mut self, count: usize, stable_threshold: u32) -> Option<Terminal> {
        if self.expected_total.is_some_and(|total| count >= total) {
            return Some(Terminal::TotalReached);
        }

        if self.last_observed == Some(count) {
            self.stable_iterations += 1;
        } else {
            self.stable_iterations = 0;
            self.last_observed = Some(count);
        }

        (self.stable_iterations >= stable_threshold).then_some(Terminal::Stable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    NextPage(&'static str),
    PaginationLink,
    ScrollRegion,
    ScrollPage,
    Nothing,
}

/// Drives a page until all of its rows are loaded.
#[derive(Debug, Clone, Default)]
pub struct Convergence {
    config: ConvergenceConfig,
}

impl Convergence {
    #[must_use]
    pub fn new(config: ConvergenceConfig) -> Self {
        Self { config }
    }

    /// Runs the loop against `page`, counting rows inside `table` when
    /// given and across the whole page otherwise.
    ///
    /// Never fails: surface errors degrade to "no action" or a zero count.
    pub async fn run<P: PageSurface>(
        &self,
        page: &P,
        table: Option<&P::Region>,
    ) -> ConvergenceOutcome {
        let start = Instant::now();
        let expected_total = match page.visible_text().await {
            Ok(text) => parse_expected_total(&text),
            Err(e) => {
                tracing::debug!(error = %e, "could not read page text for declared total");
                None
            }
        };
        let mut state = ConvergenceState::new(expected_total);
        let candidates: Vec<ActionCandidate> = NEXT_PAGE_LABELS
            .iter()
            .map(|label| ActionCandidate::new(*label, self.config.action_timeout))
            .collect();

        let mut iterations = 0_u32;
        let mut rows = self.count_rows(page, table).await;
        let mut terminal = Terminal::TimedOut;

        while start.elapsed() < self.config.budget {
            iterations += 1;
            let before = self.count_rows(page, table).await;
            let action = self.advance(page, table, &candidates).await;

            if action != Action::Nothing {
                if let Err(e) = page.wait_for_quiescence(self.config.quiescence_timeout).await {
                    tracing::debug!(error = %e, "page did not go quiet after action");
                }
            }
            tokio::time::sleep(self.config.settle_pause).await;

            rows = self.count_rows(page, table).await;
            tracing::debug!(iteration = iterations, before, after = rows, ?action, "convergence step");

            if let Some(reached) = state.observe(rows, self.config.stable_threshold) {
                terminal = reached;
                break;
            }
        }

        let outcome = ConvergenceOutcome {
            terminal,
            rows,
            iterations,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            terminal = %outcome.terminal,
            rows = outcome.rows,
            iterations = outcome.iterations,
            expected_total = ?state.expected_total,
            elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            "row loading finished"
        );
        outcome
    }

    /// Tries, in order: a next-page control, a pagination link, scrolling
    /// the table region, scrolling the page.
    async fn advance<P: PageSurface>(
        &self,
        page: &P,
        table: Option<&P::Region>,
        candidates: &[ActionCandidate],
    ) -> Action {
        if let Some(hit) = trigger_first(page, candidates).await {
            return Action::NextPage(hit.label);
        }

        match page.find_regions(PAGINATION_LINKS, Some(&*NEXT_LINK_RE)).await {
            Ok(links) => {
                if let Some(link) = links.first() {
                    match link.click(self.config.link_click_timeout).await {
                        Ok(()) => return Action::PaginationLink,
                        Err(e) => tracing::debug!(error = %e, "pagination link click failed"),
                    }
                }
            }
            Err(e) => tracing::debug!(error = %e, "pagination links not queryable"),
        }

        if let Some(region) = table {
            match region.scroll_into_max_extent().await {
                Ok(()) => return Action::ScrollRegion,
                Err(e) => tracing::debug!(error = %e, "table region not scrollable"),
            }
        }

        match page.scroll_to_bottom().await {
            Ok(()) => Action::ScrollPage,
            Err(e) => {
                tracing::debug!(error = %e, "page scroll failed");
                Action::Nothing
            }
        }
    }

    async fn count_rows<P: PageSurface>(&self, page: &P, table: Option<&P::Region>) -> usize {
        let counted = match table {
            Some(region) => region.count(&self.config.row_pattern).await,
            None => page.count(&self.config.row_pattern).await,
        };
        counted.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "row count failed; treating as zero");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_total_parses_grouped_digits() {
        assert_eq!(parse_expected_total("Showing 1-20 of 2,850"), Some(2850));
        assert_eq!(parse_expected_total("page 1 OF 40 entries"), Some(40));
    }

    #[test]
    fn expected_total_absent_zero_or_single_digit_is_none() {
        assert_eq!(parse_expected_total("Inventory"), None);
        assert_eq!(parse_expected_total("Showing 0 of 00"), None);
        // A single digit is not taken as a declared total.
        assert_eq!(parse_expected_total("1 of 5"), None);
    }

    #[test]
    fn stable_after_threshold_repeats() {
        let mut state = ConvergenceState::new(None);
        assert_eq!(state.observe(10, 3), None);
        assert_eq!(state.observe(20, 3), None);
        assert_eq!(state.observe(20, 3), None);
        assert_eq!(state.observe(20, 3), None);
        assert_eq!(state.observe(20, 3), Some(Terminal::Stable));
    }

    #[test]
    fn growth_resets_the_stable_counter() {
        let mut state = ConvergenceState::new(None);
        state.observe(10, 3);
        state.observe(10, 3);
        state.observe(10, 3);
        assert_eq!(state.stable_iterations, 2);
        state.observe(11, 3);
        assert_eq!(state.stable_iterations, 0);
        assert_eq!(state.last_observed, Some(11));
    }

    #[test]
    fn total_reached_wins_immediately() {
        let mut state = ConvergenceState::new(Some(50));
        assert_eq!(state.observe(49, 3), None);
        assert_eq!(state.observe(50, 3), Some(Terminal::TotalReached));
        let mut over = ConvergenceState::new(Some(50));
        assert_eq!(over.observe(75, 3), Some(Terminal::TotalReached));
    }

    #[test]
    fn terminal_display_names() {
        assert_eq!(Terminal::Stable.to_string(), "stable");
        assert_eq!(Terminal::TotalReached.to_string(), "total-reached");
        assert_eq!(Terminal::TimedOut.to_string(), "timed-out");
    }
}

//! Click path from the landing page to the product listing.

use std::time::Duration;

use shelfscan_scraper::{trigger_first, ActionCandidate, PageSurface};

/// One step of the click path; its labels are alternatives tried in order.
#[derive(Debug, Clone, Copy)]
pub struct NavStep {
    pub labels: &'static [ActionCandidate],
    /// Extra pause after the step, on top of the configured settle pause.
    pub linger: Duration,
}

const fn step(labels: &'static [ActionCandidate], linger: Duration) -> NavStep {
    NavStep { labels, linger }
}

const SHORT: Duration = Duration::from_secs(4);
const LONG: Duration = Duration::from_secs(5);

pub const INVENTORY_PATH: &[NavStep] = &[
    step(&[ActionCandidate::new("Tools", LONG)], Duration::ZERO),
    step(&[ActionCandidate::new("Open Data Tools", LONG)], Duration::ZERO),
    step(
        &[
            ActionCandidate::new("Open Inventory", SHORT),
            ActionCandidate::new("Inventory", SHORT),
        ],
        Duration::ZERO,
    ),
    step(&[ActionCandidate::new("Inventory", SHORT)], Duration::ZERO),
    step(
        &[
            ActionCandidate::new("Load Product Table", LONG),
            ActionCandidate::new("Load Products", LONG),
        ],
        Duration::from_secs(1),
    ),
];

/// Runs `steps` against `page`, skipping any step none of whose labels can
/// be activated. Returns how many steps fired.
pub async fn follow<P: PageSurface>(page: &P, steps: &[NavStep], settle: Duration) -> usize {
    let mut fired = 0;
    for (index, nav) in steps.iter().enumerate() {
        match trigger_first(page, nav.labels).await {
            Some(hit) => {
                fired += 1;
                tracing::info!(step = index, label = hit.label, "navigation step");
            }
            None => {
                let labels: Vec<&str> = nav.labels.iter().map(|c| c.label).collect();
                tracing::debug!(step = index, ?labels, "navigation step skipped");
            }
        }
        tokio::time::sleep(settle + nav.linger).await;
    }
    fired
}

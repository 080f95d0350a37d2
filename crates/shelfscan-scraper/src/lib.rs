//! Product extraction engine.
//!
//! Browser-agnostic: everything here talks to the page through the
//! [`surface`] traits, so the same pipeline runs against Chromium or a
//! scripted in-memory page.

pub mod dedup;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod selector;
pub mod surface;
pub mod table;
pub mod text;

pub use dedup::dedup;
pub use error::SurfaceError;
pub use normalize::normalize;
pub use pagination::{
    parse_expected_total, Convergence, ConvergenceConfig, ConvergenceOutcome, ConvergenceState,
    Terminal,
};
pub use selector::{extract_products, ExtractOptions, Extraction, StrategyKind};
pub use surface::{trigger_first, ActionCandidate, PageSurface, RegionHandle};
pub use table::{extract_table, read_table, TableSnapshot};
pub use text::{extract_from_text, strip_chrome_header};

//! Strategy selection.
//!
//! Tries extraction strategies in priority order (table, product-card text,
//! whole-page text) and returns the first one that yields records. A
//! strategy that is not applicable or finds nothing falls through to the
//! next; running out of strategies is an empty result, not an error.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use shelfscan_core::CanonicalRecord;
use tokio::time::Instant;

use crate::dedup::dedup;
use crate::normalize::normalize;
use crate::pagination::{Convergence, ConvergenceConfig, ConvergenceOutcome};
use crate::surface::{PageSurface, RegionHandle};
use crate::table::{extract_table, read_table};
use crate::text::{extract_from_text, strip_chrome_header};

/// Leading text that marks a table as the product table.
static PRODUCT_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Prod(uct)?|SKU|Name|Price").expect("valid product table regex")
});

/// Keywords that mark a block as a product card.
static CARD_SIGNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)SKU|Manufacturer|ID:|Updated").expect("valid card signal regex")
});

/// Characters of table text inspected when choosing a table.
const TABLE_PREVIEW_CHARS: usize = 200;

const CARD_CONTAINERS: &[&str] = &["div", "section", "article"];

/// Extraction strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Table,
    CardText,
    PageText,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::CardText => "card-text",
            Self::PageText => "page-text",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// How long to wait for any table to appear before using text.
    pub table_wait: Duration,
    pub table_poll_interval: Duration,
    pub convergence: ConvergenceConfig,
    /// Opening phrase of the page-chrome header stripped from text blobs.
    pub chrome_header_start: String,
    /// Card blocks this short (in characters) or shorter are ignored.
    pub min_card_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            table_wait: Duration::from_secs(10),
            table_poll_interval: Duration::from_millis(250),
            convergence: ConvergenceConfig::default(),
            chrome_header_start: "Product Inventory".to_owned(),
            min_card_chars: 40,
        }
    }
}

/// Result of [`extract_products`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Strategy that produced the records; `None` when every strategy came
    /// up empty.
    pub strategy: Option<StrategyKind>,
    pub records: Vec<CanonicalRecord>,
    /// Present when a table was found and its rows were loaded.
    pub convergence: Option<ConvergenceOutcome>,
}

/// Extracts canonical, deduplicated product records from `page`.
pub async fn extract_products<P: PageSurface>(page: &P, options: &ExtractOptions) -> Extraction {
    let mut convergence = None;

    if let Some(table) = choose_table(page, options).await {
        let outcome = Convergence::new(options.convergence.clone())
            .run(page, Some(&table))
            .await;
        convergence = Some(outcome);

        let records = table_records(&table).await;
        if records.is_empty() {
            tracing::info!("table yielded no records; trying text strategies");
        } else {
            return found(StrategyKind::Table, records, convergence);
        }
    }

    match card_blob(page, options).await {
        Some(blob) => {
            let records = extract_from_text(strip_chrome_header(&blob, &options.chrome_header_start));
            if records.is_empty() {
                tracing::info!("card blocks yielded no records; trying page text");
            } else {
                return found(StrategyKind::CardText, records, convergence);
            }
        }
        None => tracing::debug!("no product card blocks on page"),
    }

    match page.visible_text().await {
        Ok(text) => {
            let records = extract_from_text(strip_chrome_header(&text, &options.chrome_header_start));
            if !records.is_empty() {
                return found(StrategyKind::PageText, records, convergence);
            }
        }
        Err(e) => tracing::warn!(error = %e, "page text unreadable"),
    }

    tracing::warn!("no extraction strategy produced records");
    Extraction {
        strategy: None,
        records: Vec::new(),
        convergence,
    }
}

fn found(
    strategy: StrategyKind,
    records: Vec<CanonicalRecord>,
    convergence: Option<ConvergenceOutcome>,
) -> Extraction {
    tracing::info!(%strategy, records = records.len(), "extraction strategy succeeded");
    Extraction {
        strategy: Some(strategy),
        records,
        convergence,
    }
}

/// Waits up to `table_wait` for tables, then prefers one whose leading text
/// looks like a product table, else the first.
async fn choose_table<P: PageSurface>(page: &P, options: &ExtractOptions) -> Option<P::Region> {
    let tables = wait_for_tables(page, options).await;
    if tables.is_empty() {
        tracing::debug!(wait = ?options.table_wait, "no table on page");
        return None;
    }

    let mut chosen = None;
    for (index, table) in tables.iter().enumerate() {
        let preview: String = table
            .visible_text()
            .await
            .unwrap_or_default()
            .chars()
            .take(TABLE_PREVIEW_CHARS)
            .collect();
        if PRODUCT_TABLE_RE.is_match(&preview) {
            chosen = Some(index);
            break;
        }
    }

    let index = chosen.unwrap_or(0);
    tracing::debug!(
        tables = tables.len(),
        index,
        product_like = chosen.is_some(),
        "chose table"
    );
    tables.into_iter().nth(index)
}

async fn wait_for_tables<P: PageSurface>(page: &P, options: &ExtractOptions) -> Vec<P::Region> {
    let deadline = Instant::now() + options.table_wait;
    loop {
        match page.find_regions("table", None).await {
            Ok(tables) if !tables.is_empty() => return tables,
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "table lookup failed"),
        }
        if Instant::now() >= deadline {
            return Vec::new();
        }
        tokio::time::sleep(options.table_poll_interval).await;
    }
}

async fn table_records<R: RegionHandle>(table: &R) -> Vec<CanonicalRecord> {
    let Some(snapshot) = read_table(table).await else {
        tracing::warn!("table region unreadable");
        return Vec::new();
    };
    let rows = extract_table(&snapshot);
    tracing::debug!(rows = rows.len(), "read table rows");
    dedup(rows.iter().map(normalize).collect())
}

/// Joins the text of every product-card-looking block, or `None` when no
/// block survives the length filter.
async fn card_blob<P: PageSurface>(page: &P, options: &ExtractOptions) -> Option<String> {
    let mut blocks = Vec::new();
    for container in CARD_CONTAINERS {
        let regions = match page.find_regions(container, Some(&*CARD_SIGNAL_RE)).await {
            Ok(regions) => regions,
            Err(e) => {
                tracing::debug!(container, error = %e, "card lookup failed");
                continue;
            }
        };
        for region in regions {
            let Ok(text) = region.visible_text().await else {
                continue;
            };
            let text = text.trim();
            if text.chars().count() > options.min_card_chars {
                blocks.push(text.to_owned());
            }
        }
    }

    if blocks.is_empty() {
        return None;
    }
    tracing::debug!(blocks = blocks.len(), "collected card blocks");
    Some(blocks.join("\n\n"))
}

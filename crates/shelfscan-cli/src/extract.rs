//! The `extract` command: authenticate, walk to the listing, harvest every
//! product and write the result.

use std::path::Path;

use shelfscan_core::AppConfig;
use shelfscan_scraper::{extract_products, ConvergenceConfig, ExtractOptions, Extraction};

use crate::browser::{self, ChromePage};
use crate::session::{self, SessionSource};
use crate::{navigate, output};

/// Builds engine options from the environment configuration.
pub(crate) fn extract_options(config: &AppConfig) -> ExtractOptions {
    ExtractOptions {
        convergence: ConvergenceConfig {
            budget: config.converge_timeout(),
            settle_pause: config.settle_pause(),
            ..ConvergenceConfig::default()
        },
        chrome_header_start: config.chrome_header_start.clone(),
        ..ExtractOptions::default()
    }
}

/// Runs a full extraction and writes the records to `output_path`.
///
/// # Errors
///
/// Returns an error if the target URL is unset, the browser cannot be
/// launched, no session can be reused and no credentials are configured, or
/// the output file cannot be written. Everything else degrades to fewer (or
/// zero) records.
pub(crate) async fn run_extract(config: &AppConfig, output_path: &Path) -> anyhow::Result<()> {
    let target_url = config.require_target_url()?;
    let (mut browser, handler_task) = browser::launch(config).await?;

    let result = harvest(&browser, config, target_url).await;

    if let Err(e) = browser.close().await {
        tracing::debug!(error = %e, "browser close failed");
    }
    handler_task.abort();

    let extraction = result?;
    tracing::info!(
        strategy = ?extraction.strategy,
        records = extraction.records.len(),
        rows_loaded = ?extraction.convergence.as_ref().map(|c| c.rows),
        "extraction finished"
    );
    output::write_records(output_path, &extraction.records)
}

async fn harvest(
    browser: &chromiumoxide::Browser,
    config: &AppConfig,
    target_url: &str,
) -> anyhow::Result<Extraction> {
    let page = browser.new_page("about:blank").await?;
    let page = ChromePage::new(page, config.navigation_timeout());

    let source = authenticate(&page, config, target_url).await?;
    tracing::info!(?source, "authenticated");
    session::persist(&page, &config.state_path).await;

    if let Some(data_url) = &config.data_url {
        if let Err(e) = page.goto(data_url).await {
            tracing::warn!(url = %data_url, error = %e, "data page navigation failed");
        }
    }

    let fired = navigate::follow(&page, navigate::INVENTORY_PATH, config.settle_pause()).await;
    tracing::debug!(fired, "navigation script done");

    Ok(extract_products(&page, &extract_options(config)).await)
}

async fn authenticate(
    page: &ChromePage,
    config: &AppConfig,
    target_url: &str,
) -> anyhow::Result<SessionSource> {
    if let Some(snapshot) = shelfscan_core::load_snapshot(&config.state_path) {
        if session::try_reuse(page, &snapshot, target_url).await {
            return Ok(SessionSource::Reused);
        }
    }

    let credentials = config.credentials()?;
    session::login(page, target_url, &credentials).await;
    Ok(SessionSource::FreshLogin)
}

//! Convergence loop scenarios on virtual time.
//!
//! Every test runs with the tokio clock paused, so settle pauses and the
//! 120-second budget elapse instantly and deterministically.

mod common;

use std::time::Duration;

use common::{FakePage, FakeTable, RowScript};
use shelfscan_scraper::{Convergence, ConvergenceConfig, Terminal};

#[tokio::test(start_paused = true)]
async fn count_that_grows_twice_then_repeats_converges_as_stable() {
    let page = FakePage::new().rows(RowScript::Fixed(vec![10, 20, 30]));

    let outcome = Convergence::default().run(&page, None).await;

    assert_eq!(outcome.terminal, Terminal::Stable);
    assert_eq!(outcome.rows, 30);
    // 20, 30, then three unchanged observations.
    assert_eq!(outcome.iterations, 5);
    assert_eq!(page.page_scrolls(), 5);
}

#[tokio::test(start_paused = true)]
async fn declared_total_reached_exactly_stops_the_loop() {
    let page = FakePage::new()
        .body("Inventory\nShowing 1-20 of 60 products")
        .button("Load more")
        .rows(RowScript::Fixed(vec![20, 40, 60, 80]));

    let outcome = Convergence::default().run(&page, None).await;

    assert_eq!(outcome.terminal, Terminal::TotalReached);
    assert_eq!(outcome.rows, 60);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(page.triggered(), vec!["Load more", "Load more"]);
    assert_eq!(page.page_scrolls(), 0);
}

#[tokio::test(start_paused = true)]
async fn endless_growth_without_total_times_out_at_the_budget() {
    let page = FakePage::new().rows(RowScript::Growing { start: 0, step: 25 });
    let config = ConvergenceConfig::default();
    let budget = config.budget;

    let outcome = Convergence::new(config).run(&page, None).await;

    assert_eq!(outcome.terminal, Terminal::TimedOut);
    assert!(outcome.elapsed >= budget, "stopped early: {:?}", outcome.elapsed);
    assert!(
        outcome.elapsed < budget + Duration::from_secs(1),
        "overran budget: {:?}",
        outcome.elapsed
    );
    assert!(outcome.rows > 0);
}

#[tokio::test(start_paused = true)]
async fn next_button_is_preferred_over_links_and_scrolling() {
    let page = FakePage::new()
        .button("Next »")
        .next_link()
        .rows(RowScript::Fixed(vec![5, 10]));

    let outcome = Convergence::default().run(&page, None).await;

    assert_eq!(outcome.terminal, Terminal::Stable);
    assert!(page.triggered().iter().all(|label| label == "Next »"));
    assert_eq!(page.link_clicks(), 0);
    assert_eq!(page.page_scrolls(), 0);
}

#[tokio::test(start_paused = true)]
async fn pagination_link_is_clicked_when_no_button_matches() {
    let page = FakePage::new()
        .next_link()
        .rows(RowScript::Fixed(vec![5, 10, 15]));

    let outcome = Convergence::default().run(&page, None).await;

    assert_eq!(outcome.terminal, Terminal::Stable);
    assert_eq!(outcome.rows, 15);
    assert_eq!(page.link_clicks(), outcome.iterations as usize);
    assert_eq!(page.page_scrolls(), 0);
}

#[tokio::test(start_paused = true)]
async fn table_region_is_scrolled_before_the_window() {
    let page = FakePage::new().rows(RowScript::Fixed(vec![50, 100]));
    let table = page.region_for(FakeTable {
        scrollable: true,
        ..FakeTable::default()
    });

    let outcome = Convergence::default().run(&page, Some(&table)).await;

    assert_eq!(outcome.rows, 100);
    assert!(page.region_scrolls() > 0);
    assert_eq!(page.page_scrolls(), 0);
}

#[tokio::test(start_paused = true)]
async fn no_available_action_still_converges() {
    let page = FakePage::new()
        .unscrollable()
        .rows(RowScript::Fixed(vec![7]));

    let outcome = Convergence::default().run(&page, None).await;

    assert_eq!(outcome.terminal, Terminal::Stable);
    assert_eq!(outcome.rows, 7);
    assert_eq!(outcome.iterations, 4);
    assert_eq!(page.quiescence_waits(), 0);
}

#[tokio::test(start_paused = true)]
async fn custom_budget_and_threshold_are_honored() {
    let page = FakePage::new().rows(RowScript::Fixed(vec![3]));
    let config = ConvergenceConfig {
        stable_threshold: 1,
        ..ConvergenceConfig::default()
    };
    let outcome = Convergence::new(config).run(&page, None).await;
    assert_eq!(outcome.terminal, Terminal::Stable);
    assert_eq!(outcome.iterations, 2);

    let growing = FakePage::new().rows(RowScript::Growing { start: 0, step: 1 });
    let config = ConvergenceConfig {
        budget: Duration::from_secs(5),
        ..ConvergenceConfig::default()
    };
    let outcome = Convergence::new(config).run(&growing, None).await;
    assert_eq!(outcome.terminal, Terminal::TimedOut);
    assert!(outcome.elapsed >= Duration::from_secs(5));
    assert!(outcome.elapsed < Duration::from_secs(6));
}


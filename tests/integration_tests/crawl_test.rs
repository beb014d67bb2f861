//! End-to-end crawl tests over a scripted browser session
//!
//! Covers the full listing → detail → store flow:
//! 1. Multi-page crawl ending on a block page
//! 2. Exhausted pagination
//! 3. Re-crawl idempotence against SQLite
//! 4. Session preparation

use std::sync::Arc;

use beejobs::crawler::{CrawlOutcome, JobCrawler, StopReason, DESCRIPTION_UNAVAILABLE};
use beejobs::models::{Category, JobKey, JobType, SOURCE_INDEED};
use beejobs::storage::{JobQuery, JobStore, SqliteJobStore};
use beejobs::testing::{MockBrowserSession, MockJobStore};

use super::fixtures::{
    BLOCK_PAGE_HTML, DETAIL_PAGE_FALLBACK_HTML, DETAIL_PAGE_HTML, EMPTY_RESULTS_HTML,
    LISTING_PAGE_HTML, LISTING_PAGE_IDS,
};
use crate::common::{fast_config, job_card, page_url, results_page};

const BASE: &str = "https://jobs.test";

fn detail_url(jk: &str, fccid: u32) -> String {
    format!("{BASE}/rc/clk?jk={jk}&fccid={fccid}")
}

fn key(source_id: &str) -> JobKey {
    JobKey::new(SOURCE_INDEED, source_id)
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_two_page_crawl_stops_on_block_page() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    session.route(&page_url(BASE, "remote", 1), BLOCK_PAGE_HTML);

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let report = crawler
        .crawl(Box::new(session.clone()), "remote", 2)
        .await
        .expect("a block page ends the crawl without error");

    assert_eq!(report.outcome, CrawlOutcome::StoppedEarly(StopReason::Blocked));
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.jobs_processed, 4);
    assert_eq!(report.jobs_created, 4);
    assert_eq!(store.len(), 4);

    for id in LISTING_PAGE_IDS {
        assert!(store.get(&key(id)).unwrap().is_some(), "missing {id}");
    }

    // the block page is seen once; retrying it would only dig deeper
    assert_eq!(session.visit_count(&page_url(BASE, "remote", 1)), 1);
    assert!(session.is_closed());
    assert_eq!(session.close_calls(), 1);
}

#[tokio::test]
async fn test_crawl_visits_pages_then_details_in_order() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    session.route(&page_url(BASE, "remote", 1), EMPTY_RESULTS_HTML);

    let crawler = JobCrawler::new(&fast_config(BASE), Arc::new(MockJobStore::new()));
    crawler.crawl(Box::new(session.clone()), "remote", 3).await.unwrap();

    let expected = vec![
        page_url(BASE, "remote", 0),
        detail_url("a1b2c3", 11),
        detail_url("d4e5f6", 12),
        detail_url("g7h8i9", 13),
        detail_url("j0k1l2", 14),
        page_url(BASE, "remote", 1),
    ];
    assert_eq!(session.visits(), expected);
}

#[tokio::test]
async fn test_crawl_exhausted_on_empty_results() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), EMPTY_RESULTS_HTML);

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let report = crawler.crawl(Box::new(session.clone()), "remote", 3).await.unwrap();

    assert_eq!(
        report.outcome,
        CrawlOutcome::StoppedEarly(StopReason::Exhausted)
    );
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.jobs_processed, 0);
    assert!(store.is_empty());
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn test_crawl_runs_all_pages() {
    let session = MockBrowserSession::new();
    for page in 0..3 {
        let cards = [
            job_card(&format!("p{page}a"), "Backend Developer", "Acme"),
            job_card(&format!("p{page}b"), "UX Designer", "Studio"),
        ];
        session.route(&page_url(BASE, "remote", page), results_page(&cards));
    }

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let report = crawler.crawl(Box::new(session.clone()), "remote", 3).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.jobs_processed, 6);
    assert_eq!(store.len(), 6);
    // no page past max_pages is requested
    assert_eq!(session.visit_count(&page_url(BASE, "remote", 3)), 0);
}

#[tokio::test]
async fn test_zero_pages_is_done_without_navigation() {
    let session = MockBrowserSession::new();
    let crawler = JobCrawler::new(&fast_config(BASE), Arc::new(MockJobStore::new()));

    let report = crawler.crawl(Box::new(session.clone()), "remote", 0).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.pages_visited, 0);
    assert!(session.visits().is_empty());
    assert!(session.is_closed());
}

// ============================================================================
// Store Content Tests
// ============================================================================

#[tokio::test]
async fn test_crawl_fills_records_from_listing_and_detail() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    session.route(&detail_url("a1b2c3", 11), DETAIL_PAGE_HTML);
    session.route(&detail_url("g7h8i9", 13), DETAIL_PAGE_FALLBACK_HTML);

    let store = Arc::new(SqliteJobStore::in_memory().unwrap());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    let rust = store.get(&key("a1b2c3")).unwrap().unwrap();
    assert_eq!(rust.title, "Senior Rust Engineer");
    assert_eq!(rust.company, "Ferrous Systems");
    assert_eq!(rust.location, "Remote");
    assert_eq!(rust.salary.as_deref(), Some("$150,000 - $180,000 a year"));
    assert_eq!(rust.apply_url, detail_url("a1b2c3", 11));
    assert!(rust
        .description
        .contains("We build safety-critical tooling in Rust."));
    assert_eq!(rust.category, Category::Engineering);
    assert_eq!(rust.job_type, JobType::FullTime);
    assert_eq!(rust.source, SOURCE_INDEED);

    let marketing = store.get(&key("d4e5f6")).unwrap().unwrap();
    assert_eq!(marketing.company, "Acme Corp");
    assert_eq!(marketing.location, "Remote in Austin, TX");
    assert_eq!(marketing.salary, None);
    assert_eq!(marketing.category, Category::Marketing);

    let analyst = store.get(&key("g7h8i9")).unwrap().unwrap();
    assert_eq!(analyst.description, "Flexible contract role.");
    assert_eq!(analyst.job_type, JobType::PartTime);
    assert_eq!(analyst.category, Category::Data);
}

#[tokio::test]
async fn test_recrawl_updates_without_duplicates() {
    let store = Arc::new(SqliteJobStore::in_memory().unwrap());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let first = MockBrowserSession::new();
    first.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    let report = crawler.crawl(Box::new(first), "remote", 1).await.unwrap();
    assert_eq!(report.jobs_created, 4);
    assert_eq!(report.jobs_updated, 0);

    let second = MockBrowserSession::new();
    second.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    second.route(&detail_url("j0k1l2", 14), DETAIL_PAGE_HTML);
    let report = crawler.crawl(Box::new(second), "remote", 1).await.unwrap();
    assert_eq!(report.jobs_created, 0);
    assert_eq!(report.jobs_updated, 4);

    assert_eq!(store.count().unwrap(), 4);

    let refreshed = store.get(&key("j0k1l2")).unwrap().unwrap();
    assert!(refreshed.description.contains("safety-critical"));
    // classification happens once, on creation
    assert_eq!(refreshed.category, Category::Other);

    let page = store.search(&JobQuery::default()).unwrap();
    assert_eq!(page.total, 4);
}

#[tokio::test]
async fn test_unreadable_detail_keeps_record() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    session.route_failure(
        &detail_url("d4e5f6", 12),
        beejobs::utils::error::SessionError::Network("connection reset".to_string()),
    );

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let report = crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    assert_eq!(report.jobs_processed, 4);
    let job = store.get(&key("d4e5f6")).unwrap().unwrap();
    assert_eq!(job.description, DESCRIPTION_UNAVAILABLE);
    // first attempt plus two retries
    assert_eq!(session.visit_count(&detail_url("d4e5f6", 12)), 3);
}

// ============================================================================
// Session Preparation Tests
// ============================================================================

#[tokio::test]
async fn test_crawl_prepares_session_before_navigating() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), EMPTY_RESULTS_HTML);

    let crawler = JobCrawler::new(&fast_config(BASE), Arc::new(MockJobStore::new()));
    crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    let user_agent = session.user_agent().expect("user agent set");
    assert!(beejobs::crawler::stealth::USER_AGENTS.contains(&user_agent.as_str()));

    let viewport = session.viewport().expect("viewport set");
    assert_eq!((viewport.width, viewport.height), (1366, 768));

    assert!(session.extra_headers().contains_key("accept-language"));
    assert_eq!(session.init_scripts().len(), 1);
}

#[tokio::test]
async fn test_crawl_without_stealth_leaves_session_untouched() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), EMPTY_RESULTS_HTML);

    let mut config = fast_config(BASE);
    config.stealth.enabled = false;
    let crawler = JobCrawler::new(&config, Arc::new(MockJobStore::new()));
    crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    assert!(session.user_agent().is_none());
    assert!(session.init_scripts().is_empty());
}

//! Error scenario integration tests
//!
//! Tests failure modes and recovery:
//! 1. Transient navigation failures
//! 2. Exhausted retries on listing pages
//! 3. Malformed cards
//! 4. Store failures
//! 5. Oversized descriptions and debug snapshots

use std::sync::Arc;

use beejobs::crawler::{CrawlOutcome, JobCrawler, StopReason};
use beejobs::error::Error;
use beejobs::models::{JobKey, SOURCE_INDEED};
use beejobs::storage::JobStore;
use beejobs::testing::{MockBrowserSession, MockJobStore};
use beejobs::utils::error::{ExtractError, FailureKind, SessionError, StoreError};
use tempfile::TempDir;

use super::fixtures::{long_detail_page, EMPTY_RESULTS_HTML, LISTING_PAGE_HTML};
use crate::common::{fast_config, job_card, keyless_card, page_url, results_page};

const BASE: &str = "https://jobs.test";

fn navigation_timeout(page: u32) -> SessionError {
    SessionError::NavigationTimeout {
        url: page_url(BASE, "remote", page),
        timeout_ms: 30_000,
    }
}

// ============================================================================
// Navigation Error Tests
// ============================================================================

#[tokio::test]
async fn test_listing_recovers_after_transient_failures() {
    let session = MockBrowserSession::new();
    let first = page_url(BASE, "remote", 0);
    session
        .route_failure(&first, navigation_timeout(0))
        .route_failure(&first, SessionError::Network("connection reset".to_string()))
        .route(&first, LISTING_PAGE_HTML);

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let report = crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.jobs_processed, 4);
    assert_eq!(session.visit_count(&first), 3);
}

#[tokio::test]
async fn test_listing_failure_after_retries_is_fatal() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);
    session.route_failure(&page_url(BASE, "remote", 1), navigation_timeout(1));

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let err = crawler.crawl(Box::new(session.clone()), "remote", 3).await.unwrap_err();

    match &err {
        Error::RetryExhausted {
            label, attempts, ..
        } => {
            assert_eq!(label, "crawl job listings page 2");
            assert_eq!(*attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(err.to_string().contains("crawl job listings page 2"));

    // page 1 was already persisted before the failure
    assert_eq!(store.len(), 4);
    assert_eq!(session.visit_count(&page_url(BASE, "remote", 1)), 3);
    assert!(session.is_closed());
}

#[tokio::test]
async fn test_blocked_after_failures_is_not_an_error() {
    let session = MockBrowserSession::new();
    let first = page_url(BASE, "remote", 0);
    session
        .route_failure(&first, SessionError::Server(503))
        .route(&first, super::fixtures::BLOCK_PAGE_HTML);

    let crawler = JobCrawler::new(&fast_config(BASE), Arc::new(MockJobStore::new()));
    let report = crawler.crawl(Box::new(session.clone()), "remote", 2).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::StoppedEarly(StopReason::Blocked));
    assert_eq!(report.jobs_processed, 0);
}

// ============================================================================
// Malformed Card Tests
// ============================================================================

#[tokio::test]
async fn test_card_without_job_key_fails_page() {
    let session = MockBrowserSession::new();
    let cards = [
        job_card("ok1", "Backend Developer", "Acme"),
        keyless_card("Orphan Listing"),
    ];
    session.route(&page_url(BASE, "remote", 0), results_page(&cards));

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let err = crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap_err();

    assert!(matches!(
        err.root(),
        Error::Extract(ExtractError::MissingSourceId { title, .. }) if title == "Orphan Listing"
    ));
    assert!(matches!(err, Error::RetryExhausted { attempts: 3, .. }));
    // the page is never partially stored
    assert!(store.is_empty());
}

// ============================================================================
// Store Error Tests
// ============================================================================

#[tokio::test]
async fn test_rejected_record_is_fatal_without_retry() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);

    let store = Arc::new(MockJobStore::new());
    store.fail_next(StoreError::Rejected {
        key: "indeed/a1b2c3".to_string(),
        reason: "constraint violation".to_string(),
    });
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let err = crawler.crawl(Box::new(session.clone()), "remote", 2).await.unwrap_err();

    match &err {
        Error::RetryExhausted {
            label, attempts, ..
        } => {
            assert_eq!(label, "save jobs from page 1");
            assert_eq!(*attempts, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Storage);
    assert_eq!(store.upsert_calls(), 1);
    assert!(session.is_closed());
    // no second page after a fatal error
    assert_eq!(session.visit_count(&page_url(BASE, "remote", 1)), 0);
}

#[tokio::test]
async fn test_transient_store_failure_retries_whole_batch() {
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), LISTING_PAGE_HTML);

    let store = Arc::new(MockJobStore::new());
    store.fail_next(SessionError::Network("connection reset by peer".to_string()));
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());

    let report = crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    assert_eq!(report.jobs_processed, 4);
    assert_eq!(report.jobs_created, 4);
    assert_eq!(store.len(), 4);
    // one failed call, then the full batch
    assert_eq!(store.upsert_calls(), 5);
}

// ============================================================================
// Content Limit Tests
// ============================================================================

#[tokio::test]
async fn test_long_description_is_truncated() {
    let session = MockBrowserSession::new();
    let cards = [job_card("long1", "Technical Writer", "Docs Co")];
    session.route(&page_url(BASE, "remote", 0), results_page(&cards));
    session.route(
        &format!("{BASE}/rc/clk?jk=long1&fccid=flong1"),
        long_detail_page(5_000),
    );

    let store = Arc::new(MockJobStore::new());
    let crawler = JobCrawler::new(&fast_config(BASE), store.clone());
    crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();

    let job = store
        .get(&JobKey::new(SOURCE_INDEED, "long1"))
        .unwrap()
        .unwrap();
    assert_eq!(job.description.chars().count(), 2_000);
}

#[tokio::test]
async fn test_unrendered_page_snapshot_written_to_debug_dir() {
    let dir = TempDir::new().unwrap();
    let session = MockBrowserSession::new();
    session.route(&page_url(BASE, "remote", 0), EMPTY_RESULTS_HTML);

    let mut config = fast_config(BASE);
    config.crawler.debug_dir = Some(dir.path().join("snapshots"));
    let crawler = JobCrawler::new(&config, Arc::new(MockJobStore::new()));

    let report = crawler.crawl(Box::new(session.clone()), "remote", 1).await.unwrap();
    assert_eq!(
        report.outcome,
        CrawlOutcome::StoppedEarly(StopReason::Exhausted)
    );

    let snapshots: Vec<_> = std::fs::read_dir(dir.path().join("snapshots"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect();
    assert_eq!(snapshots.len(), 1);

    let saved = std::fs::read_to_string(snapshots[0].path()).unwrap();
    assert!(saved.contains("did not match any jobs"));
}

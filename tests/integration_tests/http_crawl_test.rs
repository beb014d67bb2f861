//! Crawl tests over HTTP against a local mock server

use std::sync::Arc;
use std::time::Duration;

use beejobs::crawler::{CrawlOutcome, HttpSession, JobCrawler, StopReason};
use beejobs::storage::{JobQuery, JobStore, SqliteJobStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{BLOCK_PAGE_HTML, DETAIL_PAGE_HTML, EMPTY_RESULTS_HTML, LISTING_PAGE_HTML};
use crate::common::fast_config;

async fn mount_listing(server: &MockServer, start: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("l", "remote"))
        .and(query_param("start", start))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rc/clk"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE_HTML))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_crawl_stops_on_forbidden_interstitial() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "0",
        ResponseTemplate::new(200).set_body_string(LISTING_PAGE_HTML),
    )
    .await;
    mount_listing(
        &server,
        "10",
        ResponseTemplate::new(403).set_body_string(BLOCK_PAGE_HTML),
    )
    .await;
    mount_details(&server).await;

    let store = Arc::new(SqliteJobStore::in_memory().unwrap());
    let crawler = JobCrawler::new(&fast_config(&server.uri()), store.clone());
    let session = HttpSession::new(100).unwrap();

    let report = crawler.crawl(Box::new(session), "remote", 3).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::StoppedEarly(StopReason::Blocked));
    assert_eq!(report.pages_visited, 2);
    assert_eq!(store.count().unwrap(), 4);

    let page = store
        .search(&JobQuery {
            query: Some("safety-critical".to_string()),
            ..JobQuery::default()
        })
        .unwrap();
    assert_eq!(page.total, 4);
    assert!(page
        .jobs
        .iter()
        .all(|job| job.apply_url.starts_with(&server.uri())));

    // 2 listing pages plus 4 detail pages
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn test_http_crawl_retries_rate_limited_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "0",
        ResponseTemplate::new(200).set_body_string(LISTING_PAGE_HTML),
    )
    .await;
    mount_details(&server).await;

    let store = Arc::new(SqliteJobStore::in_memory().unwrap());
    let crawler = JobCrawler::new(&fast_config(&server.uri()), store.clone());
    let session = HttpSession::new(100).unwrap();

    let report = crawler.crawl(Box::new(session), "remote", 1).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.jobs_created, 4);
}

#[tokio::test]
async fn test_http_crawl_exhausts_on_empty_page() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "0",
        ResponseTemplate::new(200).set_body_string(EMPTY_RESULTS_HTML),
    )
    .await;

    let store = Arc::new(SqliteJobStore::in_memory().unwrap());
    let crawler = JobCrawler::new(&fast_config(&server.uri()), store.clone());
    let session = HttpSession::new(100).unwrap();

    let report = crawler.crawl(Box::new(session), "remote", 3).await.unwrap();

    assert_eq!(
        report.outcome,
        CrawlOutcome::StoppedEarly(StopReason::Exhausted)
    );
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_http_crawl_slow_server_fails_after_retries() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "0",
        ResponseTemplate::new(200)
            .set_body_string(LISTING_PAGE_HTML)
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let mut config = fast_config(&server.uri());
    config.crawler.navigation_timeout_ms = 100;
    config.retry.max_retries = 1;

    let store = Arc::new(SqliteJobStore::in_memory().unwrap());
    let crawler = JobCrawler::new(&config, store.clone());
    let session = HttpSession::new(100).unwrap();

    let err = crawler.crawl(Box::new(session), "remote", 1).await.unwrap_err();

    assert!(err.to_string().contains("crawl job listings page 1"));
    assert!(err.to_string().contains("failed after 2 attempt(s)"));
    assert_eq!(store.count().unwrap(), 0);
}

//! Sequential crawl loop
//!
//! One browser session, one page at a time:
//!
//! ```text
//! prepare session
//!   └─▶ page n: listing (retried)
//!         ├─ Blocked / Exhausted ──▶ stop early
//!         └─ Jobs ──▶ per job: detail (retried, sentinel on failure) + pacing
//!                 └─▶ persist batch (retried) ──▶ pacing ──▶ page n+1
//! ```
//!
//! The crawl owns its session and closes it on every exit path, including
//! fatal errors.
//!
//! # Example
//!
//! ```no_run
//! use beejobs::config::Config;
//! use beejobs::crawler::pipeline::JobCrawler;
//! use beejobs::crawler::session::HttpSession;
//! use beejobs::storage::create_sqlite_store;
//!
//! # async fn example() -> beejobs::error::Result<()> {
//! let config = Config::default();
//! let store = create_sqlite_store(&config.database.sqlite_path)?;
//! let crawler = JobCrawler::new(&config, store);
//!
//! let session = HttpSession::new(config.crawler.rate_limit)?;
//! let report = crawler.crawl(Box::new(session), "remote", 3).await?;
//! println!("Processed {} jobs", report.jobs_processed);
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, CrawlerConfig};
use crate::crawler::detail::DetailEnricher;
use crate::crawler::listing::{ListingExtractor, ListingPage};
use crate::crawler::pacing::{PaceKind, Pacer};
use crate::crawler::session::BrowserSession;
use crate::crawler::stealth::StealthConfigurator;
use crate::crawler::url::listing_page_url;
use crate::error::Result;
use crate::models::{JobRecord, SOURCE_INDEED};
use crate::storage::{JobPersister, SharedJobStore};
use crate::utils::retry::{with_retry, RetryConfig};

// ============================================================================
// Outcome Types
// ============================================================================

/// Why pagination stopped before `max_pages`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// The site served a CAPTCHA or anti-bot page
    Blocked,
    /// A page rendered no job cards
    Exhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocked => f.write_str("blocked"),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// Successful end of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "reason")]
pub enum CrawlOutcome {
    /// Every requested page was processed
    Done,
    StoppedEarly(StopReason),
}

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,
    pub pages_visited: u32,
    pub jobs_processed: usize,
    pub jobs_created: usize,
    pub jobs_updated: usize,
}

// ============================================================================
// Crawl Session
// ============================================================================

/// Per-invocation state: the session it owns, the current page and the
/// running totals
struct CrawlSession {
    browser: Box<dyn BrowserSession>,
    page: u32,
    processed: usize,
    created: usize,
    updated: usize,
}

impl CrawlSession {
    fn new(browser: Box<dyn BrowserSession>) -> Self {
        Self {
            browser,
            page: 0,
            processed: 0,
            created: 0,
            updated: 0,
        }
    }

    fn browser(&self) -> &dyn BrowserSession {
        self.browser.as_ref()
    }

    fn finish(&self, outcome: CrawlOutcome) -> CrawlReport {
        CrawlReport {
            outcome,
            pages_visited: self.page,
            jobs_processed: self.processed,
            jobs_created: self.created,
            jobs_updated: self.updated,
        }
    }
}

// ============================================================================
// Crawler
// ============================================================================

/// Drives a paginated crawl of the listings site into a job store
pub struct JobCrawler {
    config: CrawlerConfig,
    retry: RetryConfig,
    pacer: Pacer,
    stealth: StealthConfigurator,
    listing: ListingExtractor,
    detail: DetailEnricher,
    persister: JobPersister,
}

impl JobCrawler {
    pub fn new(config: &Config, store: SharedJobStore) -> Self {
        Self {
            config: config.crawler.clone(),
            retry: config.retry.clone(),
            pacer: Pacer::new(config.pacing.clone()),
            stealth: StealthConfigurator::new(config.stealth.clone()),
            listing: ListingExtractor::new(&config.crawler),
            detail: DetailEnricher::new(&config.crawler),
            persister: JobPersister::new(store, SOURCE_INDEED),
        }
    }

    /// Crawl up to `max_pages` result pages for `location`
    ///
    /// The crawl takes `session` and closes it before returning.
    ///
    /// `Ok` covers both a full run and an early stop; callers must treat a
    /// run that stored nothing as success. `Err` carries the step label and
    /// attempt count of the failure that ended the crawl.
    pub async fn crawl(
        &self,
        session: Box<dyn BrowserSession>,
        location: &str,
        max_pages: u32,
    ) -> Result<CrawlReport> {
        info!(location, max_pages, "Starting crawl");

        let mut state = CrawlSession::new(session);
        let result = self
            .run(&mut state, location, max_pages)
            .await
            .map(|outcome| state.finish(outcome));

        if let Err(e) = state.browser().close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        match &result {
            Ok(report) => info!(
                outcome = ?report.outcome,
                pages = report.pages_visited,
                processed = report.jobs_processed,
                created = report.jobs_created,
                updated = report.jobs_updated,
                "Crawl finished"
            ),
            Err(e) => tracing::error!(error = %e, "Crawl failed"),
        }

        result
    }

    async fn run(
        &self,
        state: &mut CrawlSession,
        location: &str,
        max_pages: u32,
    ) -> Result<CrawlOutcome> {
        state.browser().new_page().await?;
        self.stealth.prepare(state.browser()).await?;

        while state.page < max_pages {
            let page_number = state.page + 1;
            info!(page = page_number, "Crawling page");

            let url = listing_page_url(&self.config.base_url, location, state.page)?;
            let listing = self.extract_listing(state, &url, page_number).await?;
            state.page += 1;

            let mut jobs = match listing {
                ListingPage::Jobs(jobs) => jobs,
                ListingPage::Blocked => {
                    warn!(page = page_number, "Blocked by target site, stopping pagination");
                    return Ok(CrawlOutcome::StoppedEarly(StopReason::Blocked));
                }
                ListingPage::Exhausted => {
                    info!(page = page_number, "No jobs found, stopping crawl");
                    return Ok(CrawlOutcome::StoppedEarly(StopReason::Exhausted));
                }
            };

            for job in jobs.iter_mut() {
                self.detail.enrich(state.browser(), job, &self.retry).await;
                self.pacer.wait(PaceKind::BetweenDetailVisits).await;
            }

            self.persist_page(state, &jobs, page_number).await?;

            info!(
                page = page_number,
                count = jobs.len(),
                "Successfully processed jobs from page"
            );

            if state.page < max_pages {
                self.pacer.wait(PaceKind::BetweenPages).await;
            }
        }

        Ok(CrawlOutcome::Done)
    }

    async fn extract_listing(
        &self,
        state: &CrawlSession,
        url: &str,
        page_number: u32,
    ) -> Result<ListingPage> {
        let browser = state.browser();
        let listing = &self.listing;
        let label = format!("crawl job listings page {page_number}");

        with_retry(&self.retry, &label, move || listing.extract(browser, url)).await
    }

    async fn persist_page(
        &self,
        state: &mut CrawlSession,
        jobs: &[JobRecord],
        page_number: u32,
    ) -> Result<()> {
        let persister = &self.persister;
        let label = format!("save jobs from page {page_number}");

        let report = with_retry(&self.retry, &label, move || async move {
            persister.persist(jobs)
        })
        .await?;

        state.processed += jobs.len();
        state.created += report.created;
        state.updated += report.updated;
        Ok(())
    }
}

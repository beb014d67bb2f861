//! Listing page extraction
//!
//! Turns one results page into partial [`JobRecord`]s (no description yet)
//! or into a stop signal for the crawl loop.

use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::crawler::session::{evaluate, BrowserSession, NavigateOptions};
use crate::crawler::url::{apply_url, source_id_from_href};
use crate::error::Result;
use crate::models::JobRecord;
use crate::parser::{self, selectors::LISTING_CARD, ListingCard};
use crate::utils::error::{ExtractError, FailureKind};
use crate::utils::sanitize_filename;

/// What a results page turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingPage {
    /// Records from every titled card
    Jobs(Vec<JobRecord>),
    /// CAPTCHA or anti-bot page; pagination must stop
    Blocked,
    /// No cards rendered and no block signal
    Exhausted,
}

/// Extracts job cards from listing pages
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    base_url: String,
    navigation_timeout: Duration,
    render_timeout: Duration,
    debug_dir: Option<PathBuf>,
}

impl ListingExtractor {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            navigation_timeout: config.navigation_timeout(),
            render_timeout: config.render_timeout(),
            debug_dir: config.debug_dir.clone(),
        }
    }

    /// Navigate to `page_url` and read its job cards
    ///
    /// # Errors
    ///
    /// Navigation failures propagate unchanged. A titled card whose link has
    /// no job key fails the whole page with [`ExtractError::MissingSourceId`].
    pub async fn extract(&self, session: &dyn BrowserSession, page_url: &str) -> Result<ListingPage> {
        session
            .goto(page_url, NavigateOptions::new(self.navigation_timeout))
            .await?;

        if let Err(e) = session
            .wait_for_selector(LISTING_CARD, self.render_timeout)
            .await
        {
            if e.kind() != FailureKind::Timeout {
                return Err(e);
            }

            if evaluate(session, parser::is_blocked).await? {
                warn!(url = %page_url, "Block page detected instead of results");
                return Ok(ListingPage::Blocked);
            }

            info!(url = %page_url, "No job cards rendered within timeout");
            self.save_snapshot(session, page_url).await;
            return Ok(ListingPage::Exhausted);
        }

        let (blocked, cards) = evaluate(session, |document| {
            (parser::is_blocked(document), parser::parse_cards(document))
        })
        .await?;

        if blocked {
            warn!(url = %page_url, "Block signal on rendered results page");
            return Ok(ListingPage::Blocked);
        }

        let posted_date = Utc::now().date_naive();
        let jobs = cards
            .into_iter()
            .map(|card| self.to_record(card, posted_date))
            .collect::<Result<Vec<_>>>()?;

        debug!(url = %page_url, count = jobs.len(), "Extracted listing cards");

        if jobs.is_empty() {
            Ok(ListingPage::Exhausted)
        } else {
            Ok(ListingPage::Jobs(jobs))
        }
    }

    fn to_record(&self, card: ListingCard, posted_date: NaiveDate) -> Result<JobRecord> {
        let Some(source_id) = card.href.as_deref().and_then(source_id_from_href) else {
            return Err(ExtractError::MissingSourceId {
                title: card.title,
                href: card.href,
            }
            .into());
        };
        let href = card.href.unwrap_or_default();

        Ok(JobRecord {
            title: card.title,
            company: card.company,
            location: card.location,
            description: String::new(),
            salary: card.salary,
            job_type: None,
            category: None,
            apply_url: apply_url(&self.base_url, &href)?,
            posted_date,
            source_id,
        })
    }

    /// Keep a capture of a page that never rendered, when a debug dir is set
    async fn save_snapshot(&self, session: &dyn BrowserSession, page_url: &str) {
        let capture = match session.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(error = %e, "Snapshot unavailable");
                return;
            }
        };

        let Some(dir) = &self.debug_dir else {
            debug!(bytes = capture.len(), "Snapshot taken, no debug_dir configured");
            return;
        };

        let path = dir.join(format!("{}.snapshot", sanitize_filename(page_url)));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, &capture).await
        }
        .await;

        match written {
            Ok(()) => info!(path = %path.display(), "Saved snapshot of unrendered page"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to save snapshot"),
        }
    }
}

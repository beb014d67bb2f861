//! Detail page enrichment
//!
//! Fills a listing record's description from its detail page. A record whose
//! detail page cannot be read keeps going with [`DESCRIPTION_UNAVAILABLE`];
//! one bad record never aborts its batch.

use std::time::Duration;
use tracing::{debug, warn};

use crate::config::CrawlerConfig;
use crate::crawler::session::{evaluate, BrowserSession, NavigateOptions};
use crate::error::Result;
use crate::models::JobRecord;
use crate::parser;
use crate::utils::retry::{with_retry, RetryConfig};
use crate::utils::truncate_chars;

/// Description stored when the detail page could not be read
pub const DESCRIPTION_UNAVAILABLE: &str = "Description not available";

/// Reads descriptions from detail pages
#[derive(Debug, Clone)]
pub struct DetailEnricher {
    timeout: Duration,
    max_chars: usize,
}

impl DetailEnricher {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            timeout: config.detail_timeout(),
            max_chars: config.description_max_chars,
        }
    }

    /// Navigate to `apply_url` and read the description body
    ///
    /// An empty string means the page loaded but no strategy matched.
    pub async fn fetch_description(
        &self,
        session: &dyn BrowserSession,
        apply_url: &str,
    ) -> Result<String> {
        session
            .goto(apply_url, NavigateOptions::new(self.timeout))
            .await?;

        let description = evaluate(session, parser::parse_description)
            .await?
            .unwrap_or_default();

        Ok(truncate_chars(&description, self.max_chars))
    }

    /// Fill `record.description`, retrying transient failures first
    ///
    /// Never fails: after the retry budget the sentinel is used.
    pub async fn enrich(
        &self,
        session: &dyn BrowserSession,
        record: &mut JobRecord,
        retry: &RetryConfig,
    ) {
        if record.apply_url.is_empty() {
            debug!(source_id = %record.source_id, "No apply URL, skipping detail visit");
            return;
        }

        let label = format!("crawl job detail for {}", record.title);
        let apply_url = record.apply_url.as_str();

        let fetched = with_retry(retry, &label, move || {
            self.fetch_description(session, apply_url)
        })
        .await;

        record.description = match fetched {
            Ok(description) => description,
            Err(e) => {
                warn!(
                    source_id = %record.source_id,
                    error = %e,
                    "Detail page unavailable, using placeholder description"
                );
                DESCRIPTION_UNAVAILABLE.to_string()
            }
        };
    }
}

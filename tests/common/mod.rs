//! Common test utilities

#![allow(dead_code)]

use beejobs::config::Config;
use beejobs::crawler::pacing::PacingConfig;
use beejobs::crawler::url::listing_page_url;
use beejobs::utils::retry::RetryConfig;

/// Configuration that crawls `base_url` without pacing and with millisecond backoff
pub fn fast_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.base_url = base_url.to_string();
    config.crawler.navigation_timeout_ms = 2_000;
    config.crawler.render_timeout_ms = 100;
    config.crawler.detail_timeout_ms = 2_000;
    config.pacing = PacingConfig::disabled();
    config.retry = fast_retry(2);
    config
}

pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 10,
        backoff_multiplier: 2.0,
        jitter_ms: 0,
    }
}

/// Absolute URL of listing page `page` for `location`
pub fn page_url(base_url: &str, location: &str, page: u32) -> String {
    listing_page_url(base_url, location, page).unwrap()
}

/// One listing card with a title link carrying `jk`
pub fn job_card(jk: &str, title: &str, company: &str) -> String {
    format!(
        r#"<div class="job_seen_beacon">
             <h2 class="jobTitle"><a href="/rc/clk?jk={jk}&amp;fccid=f{jk}"><span>{title}</span></a></h2>
             <span data-testid="company-name">{company}</span>
             <div data-testid="text-location">Remote</div>
           </div>"#
    )
}

/// A card without a title element
pub fn untitled_card() -> String {
    r#"<div class="job_seen_beacon">
         <span data-testid="company-name">Sponsored</span>
       </div>"#
        .to_string()
}

/// A titled card whose link has no job key
pub fn keyless_card(title: &str) -> String {
    format!(
        r#"<div class="job_seen_beacon">
             <h2 class="jobTitle"><a href="/viewjob?from=serp">{title}</a></h2>
           </div>"#
    )
}

/// Wrap cards into a results page
pub fn results_page(cards: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Remote Jobs</title></head>
<body><div id="mosaic-jobResults">{}</div></body>
</html>"#,
        cards.join("\n")
    )
}

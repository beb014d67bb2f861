//! URL building and job-key extraction for the listings site
//!
//! Result pages are addressed as `{base}/jobs?l={location}&start={page*10}`;
//! card links are site-relative and carry the job key in their `jk` query
//! parameter.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::error::Result;
use crate::utils::error::ExtractError;

/// Results shown per listing page
pub const RESULTS_PER_PAGE: u32 = 10;

/// Absolute URL of listing page `page` (0-based) for `location`
///
/// # Examples
///
/// ```
/// use beejobs::crawler::url::listing_page_url;
///
/// let url = listing_page_url("https://www.indeed.com", "New York, NY", 2).unwrap();
/// assert_eq!(url, "https://www.indeed.com/jobs?l=New%20York%2C%20NY&start=20");
/// ```
pub fn listing_page_url(base_url: &str, location: &str, page: u32) -> Result<String> {
    let base = parse_base(base_url)?;
    let start = page.saturating_mul(RESULTS_PER_PAGE);
    Ok(format!(
        "{}/jobs?l={}&start={}",
        base.as_str().trim_end_matches('/'),
        urlencoding::encode(location),
        start
    ))
}

fn parse_base(base_url: &str) -> Result<Url> {
    let base = Url::parse(base_url)
        .map_err(|e| ExtractError::InvalidUrl(format!("{base_url}: {e}")))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidUrl(format!("unsupported scheme: {base_url}")).into());
    }
    Ok(base)
}

/// Resolve a card href against the site base
///
/// Absolute hrefs resolve to themselves.
pub fn apply_url(base_url: &str, href: &str) -> Result<String> {
    let joined = parse_base(base_url)?
        .join(href)
        .map_err(|e| ExtractError::InvalidUrl(format!("{href}: {e}")))?;
    Ok(joined.to_string())
}

fn job_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[?&]jk=([^&#]+)").expect("Invalid regex pattern"))
}

/// Job key from the `jk` parameter of a card href
///
/// Returns `None` when the parameter is absent or empty.
pub fn source_id_from_href(href: &str) -> Option<String> {
    job_key_pattern()
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

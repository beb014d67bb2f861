//! Test fixtures for integration tests
//!
//! Static pages shaped like the listings site's results, block and detail
//! pages.

#![allow(dead_code)]

/// Results page with five cards; the third has no title and must be skipped
pub const LISTING_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Remote Jobs, Employment | Job Search</title>
</head>
<body>
<div id="mosaic-jobResults">
  <ul class="jobsearch-ResultsList">
    <li>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a href="/rc/clk?jk=a1b2c3&amp;fccid=11"><span title="Senior Rust Engineer">Senior Rust Engineer</span></a></h2>
        <div class="company_location">
          <span data-testid="company-name">Ferrous Systems</span>
          <div data-testid="text-location">Remote</div>
        </div>
        <div class="salary-snippet-container">$150,000 - $180,000 a year</div>
      </div>
    </li>
    <li>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a href="/rc/clk?jk=d4e5f6&amp;fccid=12"><span>Growth Marketing Manager</span></a></h2>
        <div class="company_location">
          <span data-testid="company-name">Acme   Corp</span>
          <div data-testid="text-location">Remote in
             Austin, TX</div>
        </div>
      </div>
    </li>
    <li>
      <div class="job_seen_beacon">
        <div class="sponsored">Sponsored employers</div>
        <span data-testid="company-name">Placeholder</span>
      </div>
    </li>
    <li>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a href="/rc/clk?jk=g7h8i9&amp;fccid=13"><span>Data Analyst (Part Time)</span></a></h2>
        <div class="company_location">
          <span data-testid="company-name">Numbers Inc</span>
          <div data-testid="text-location">Remote</div>
        </div>
        <div class="salary-snippet-container">$30 an hour</div>
      </div>
    </li>
    <li>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a href="/rc/clk?jk=j0k1l2&amp;fccid=14"><span>Site Reliability Lead</span></a></h2>
        <div class="company_location">
          <span data-testid="company-name">Uptime LLC</span>
        </div>
      </div>
    </li>
  </ul>
</div>
</body>
</html>
"#;

/// Source ids of the titled cards on [`LISTING_PAGE_HTML`], in page order
pub const LISTING_PAGE_IDS: [&str; 4] = ["a1b2c3", "d4e5f6", "g7h8i9", "j0k1l2"];

/// Verification interstitial served instead of results
pub const BLOCK_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Security Check - Indeed.com</title></head>
<body>
  <h1>Additional Verification Required</h1>
  <div id="challenge-form">
    <p>Please complete the check below to continue.</p>
  </div>
</body>
</html>
"#;

/// A results page past the last hit
pub const EMPTY_RESULTS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Remote Jobs | Job Search</title></head>
<body>
  <div class="jobsearch-NoResult-messageContainer">
    <p>The search did not match any jobs.</p>
  </div>
</body>
</html>
"#;

/// Detail page using the primary description container
pub const DETAIL_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Senior Rust Engineer - Ferrous Systems</title></head>
<body>
  <div class="jobsearch-JobComponent">
    <div id="jobDescriptionText">
      <p>We build safety-critical tooling in Rust.</p>
      <ul><li>Own the async runtime integration</li></ul>
    </div>
  </div>
</body>
</html>
"#;

/// Detail page using a fallback description container
pub const DETAIL_PAGE_FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
  <section data-testid="job-description">Flexible contract role.</section>
</body>
</html>
"#;

/// Detail page with a description far over the stored limit
pub fn long_detail_page(chars: usize) -> String {
    format!(
        r#"<html><body><div id="jobDescriptionText">{}</div></body></html>"#,
        "x".repeat(chars)
    )
}

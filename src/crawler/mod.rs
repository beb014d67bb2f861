//! Crawl engine for the job listings site
//!
//! [`pipeline::JobCrawler`] sequences the pieces below over a
//! [`session::BrowserSession`]:
//!
//! - [`stealth`]: fingerprint preparation of a fresh session
//! - [`listing`]: job cards from one results page, or a stop signal
//! - [`detail`]: description from a job's detail page
//! - [`pacing`]: randomized waits between requests
//! - [`url`]: page URLs and job keys

pub mod detail;
pub mod listing;
pub mod pacing;
pub mod pipeline;
pub mod session;
pub mod stealth;
pub mod url;

pub use detail::{DetailEnricher, DESCRIPTION_UNAVAILABLE};
pub use listing::{ListingExtractor, ListingPage};
pub use pacing::{PaceKind, Pacer, PacingConfig};
pub use pipeline::{CrawlOutcome, CrawlReport, JobCrawler, StopReason};
pub use session::{BrowserSession, HttpSession, MockBrowserSession, NavigateOptions, Viewport};
pub use stealth::{StealthConfig, StealthConfigurator};

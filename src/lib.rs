//! beejobs - Job listings aggregator
//!
//! Periodically scrapes a job listings site and keeps the postings in a
//! searchable store.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Sequential crawl engine over a browser session
//! - [`parser`] - HTML parsing of listing and detail pages
//! - [`heuristics`] - Job type and category inference
//! - [`models`] - Core data structures and types
//! - [`storage`] - Job store (SQLite) and batch persistence
//! - [`error`] - Unified error type and failure classification
//! - [`utils`] - Retry, classification and text helpers
//!
//! # Example
//!
//! ```no_run
//! use beejobs::config::Config;
//! use beejobs::crawler::{HttpSession, JobCrawler};
//! use beejobs::storage::create_sqlite_store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = create_sqlite_store(&config.database.sqlite_path)?;
//!     let crawler = JobCrawler::new(&config, store);
//!
//!     let session = HttpSession::new(config.crawler.rate_limit)?;
//!     crawler.crawl(Box::new(session), "remote", 3).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod heuristics;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{BrowserSession, CrawlOutcome, CrawlReport, JobCrawler, StopReason};
    pub use crate::error::{BeejobsErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Category, JobKey, JobRecord, JobType, StoredJob};
    pub use crate::storage::{JobStore, SqliteJobStore};
}

/// In-memory stand-ins for the browser and the store
pub mod testing {
    pub use crate::crawler::session::{MockBrowserSession, MockResponse};
    pub use crate::storage::repository::{create_mock_store, MockJobStore};
}

// Direct re-exports for convenience
pub use models::{Category, JobRecord, JobType};

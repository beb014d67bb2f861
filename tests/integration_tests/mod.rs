//! Integration tests module
//!
//! End-to-end tests for the beejobs crawl engine:
//! - Listing → detail → store pipeline over a scripted session
//! - The same pipeline over HTTP against a local server
//! - Failure handling and recovery scenarios

pub mod crawl_test;
pub mod error_scenarios;
pub mod fixtures;
pub mod http_crawl_test;

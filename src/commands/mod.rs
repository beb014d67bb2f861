pub mod crawl;
pub mod search;

// Re-export command functions for convenience
pub use crawl::{crawl, stats};
pub use search::{filters, search};

//! Error types for the beejobs crawler
//!
//! Every failure raised by the browser session, the extractors or the store
//! carries a [`FailureKind`] next to its human-readable message, so the
//! retry layer can decide on structure first and fall back to wording.

use thiserror::Error;

/// Structured cause of a failure, independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Navigation, selector or request timeout
    Timeout,
    /// Connection reset/refused, DNS retry, socket errors
    Network,
    /// HTTP 429 or an explicit rate-limit response
    RateLimited,
    /// HTTP 5xx
    Server,
    /// Browser target or session went away
    SessionClosed,
    /// CAPTCHA or anti-bot page served instead of content
    Blocked,
    /// The page rendered but a record is missing required data
    Incomplete,
    /// Unexpected data shape
    Data,
    /// Store rejected the operation
    Storage,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Whether waiting and retrying can resolve this kind of failure
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::Network
                | Self::RateLimited
                | Self::Server
                | Self::SessionClosed
                | Self::Blocked
                | Self::Incomplete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::SessionClosed => "session_closed",
            Self::Blocked => "blocked",
            Self::Incomplete => "incomplete",
            Self::Data => "data",
            Self::Storage => "storage",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a browser session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Page did not finish loading in time
    #[error("Navigation timeout of {timeout_ms}ms exceeded: {url}")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    /// Selector never appeared in the rendered document
    #[error("Waiting for selector `{selector}` failed: timeout {timeout_ms}ms exceeded")]
    SelectorTimeout { selector: String, timeout_ms: u64 },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Target answered 429
    #[error("Too many requests (429)")]
    RateLimited,

    /// Target answered with a 5xx status
    #[error("Server error {0} (5xx)")]
    Server(u16),

    /// The session has been closed
    #[error("Session closed")]
    Closed,

    /// `new_page` was never called
    #[error("No page open in session")]
    NoPage,

    /// Nothing has been navigated to yet
    #[error("No document loaded")]
    NoDocument,

    /// Invalid CSS selector
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Header name or value rejected
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NavigationTimeout { .. } | Self::SelectorTimeout { .. } => FailureKind::Timeout,
            Self::Network(_) => FailureKind::Network,
            Self::RateLimited => FailureKind::RateLimited,
            Self::Server(_) => FailureKind::Server,
            Self::Closed => FailureKind::SessionClosed,
            Self::NoPage | Self::NoDocument => FailureKind::Other,
            Self::InvalidSelector(_) | Self::InvalidHeader(_) => FailureKind::Data,
        }
    }
}

/// Errors that can occur while extracting records from rendered pages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// A titled listing card whose link carries no job key
    #[error("Listing `{title}` has no source id (href: {href:?})")]
    MissingSourceId { title: String, href: Option<String> },

    /// Invalid URL built from configuration or page data
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ExtractError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingSourceId { .. } => FailureKind::Incomplete,
            Self::InvalidUrl(_) => FailureKind::Data,
        }
    }
}

/// Errors raised by the job store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store refused the record
    #[error("Record {key} rejected: {reason}")]
    Rejected { key: String, reason: String },

    /// A previous holder of the connection lock panicked
    #[error("Store lock poisoned")]
    Poisoned,

    /// I/O while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Storage
    }
}

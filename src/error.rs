//! Unified error handling for the beejobs crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`BeejobsErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors by subsystem
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use beejobs::error::{BeejobsErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {err}");
//!     } else {
//!         eprintln!("Fatal error: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::utils::classifier::{classify, Classification};
pub use crate::utils::error::{ExtractError, FailureKind, SessionError, StoreError};

/// Common trait for all beejobs error types
pub trait BeejobsErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Subsystem an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Browser session and transport errors
    Browser,
    /// Listing and detail extraction errors
    Extraction,
    /// Job store errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the beejobs crate
#[derive(Error, Debug)]
pub enum Error {
    /// Browser session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Job store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An operation that gave up, with the attempts it took
    #[error("{label} failed after {attempts} attempt(s): {source}")]
    RetryExhausted {
        label: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Structured failure kind, looking through retry wrappers
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Session(e) => e.kind(),
            Self::Extract(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::RetryExhausted { source, .. } => source.kind(),
            Self::Http(e) if e.is_timeout() => FailureKind::Timeout,
            Self::Http(e) if e.is_connect() || e.is_request() => FailureKind::Network,
            Self::Json(_) => FailureKind::Data,
            Self::Http(_) | Self::Io(_) | Self::Config(_) | Self::Other { .. } => {
                FailureKind::Other
            }
        }
    }

    /// The innermost error, unwrapping retry labels
    pub fn root(&self) -> &Error {
        match self {
            Self::RetryExhausted { source, .. } => source.root(),
            other => other,
        }
    }
}

impl BeejobsErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        classify(self) == Classification::Transient
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Session(_) | Self::Http(_) => ErrorCategory::Browser,
            Self::Extract(_) | Self::Json(_) => ErrorCategory::Extraction,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::RetryExhausted { source, .. } => source.category(),
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

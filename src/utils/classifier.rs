//! Transient-versus-fatal classification of failures
//!
//! The structured [`FailureKind`] is consulted first. Failures whose kind
//! says nothing (data, storage, other) are then matched on their lowercased
//! message, so errors bubbling up with only wording still classify the same
//! way: network trouble, rate limiting, closed browser targets and soft
//! blocks retry; everything else is fatal.

use crate::error::Error;
use crate::utils::error::FailureKind;

/// Outcome of classifying a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Expected to clear after waiting
    Transient,
    /// Retrying will not help
    Fatal,
}

/// Message fragments that mark a failure as transient
const TRANSIENT_MARKERS: &[&str] = &[
    // network
    "timeout",
    "network",
    "econnreset",
    "econnrefused",
    "eai_again",
    "socket",
    "navigation timeout",
    // rate limiting or overloaded target
    "rate limit",
    "too many requests",
    "429",
    "5xx",
    // browser target lifecycle
    "target closed",
    "session closed",
    "detached from target",
    // soft blocks
    "captcha",
    "blocked",
    "access denied",
];

/// Classify a crate error
pub fn classify(error: &Error) -> Classification {
    if error.kind().is_transient() {
        return Classification::Transient;
    }
    classify_message(&error.to_string())
}

/// Classify a bare failure message
pub fn classify_message(message: &str) -> Classification {
    let normalized = message.to_lowercase();
    if TRANSIENT_MARKERS
        .iter()
        .any(|marker| normalized.contains(marker))
    {
        Classification::Transient
    } else {
        Classification::Fatal
    }
}

/// Classify a structured kind alone
pub fn classify_kind(kind: FailureKind) -> Classification {
    if kind.is_transient() {
        Classification::Transient
    } else {
        Classification::Fatal
    }
}

//! Retry utilities for resilient crawl steps
//!
//! Every step of a crawl (listing extraction, detail visits, persistence) runs
//! through [`with_retry`], which combines the failure classifier, exponential
//! backoff with jitter, and a fixed attempt budget.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::utils::classifier::{classify, Classification};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,

    /// Upper bound (exclusive) of the uniform jitter added to each delay
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_ms: 1000,
        }
    }
}

/// Per-call overrides applied on top of a [`RetryConfig`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryOverride {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub jitter_ms: Option<u64>,
}

impl RetryConfig {
    /// Create a new retry configuration with custom max retries
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a retry configuration with custom delays
    pub fn with_delays(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            ..Default::default()
        }
    }

    /// Merge per-call overrides into a copy of this configuration
    #[must_use]
    pub fn merged(&self, overrides: &RetryOverride) -> Self {
        Self {
            max_retries: overrides.max_retries.unwrap_or(self.max_retries),
            base_delay_ms: overrides.base_delay_ms.unwrap_or(self.base_delay_ms),
            max_delay_ms: overrides.max_delay_ms.unwrap_or(self.max_delay_ms),
            backoff_multiplier: overrides
                .backoff_multiplier
                .unwrap_or(self.backoff_multiplier),
            jitter_ms: overrides.jitter_ms.unwrap_or(self.jitter_ms),
        }
    }

    /// Backoff delay for `attempt` (0-based) with the given jitter:
    /// `min(base * multiplier^attempt + jitter, max)`
    pub fn delay_with_jitter(&self, attempt: u32, jitter_ms: u64) -> Duration {
        let exponential = self.base_delay_ms as f64
            * self
                .backoff_multiplier
                .powi(attempt.min(i32::MAX as u32) as i32);
        let delay_ms = (exponential + jitter_ms as f64).min(self.max_delay_ms as f64);

        Duration::from_millis(delay_ms.max(0.0) as u64)
    }

    /// Backoff delay for `attempt` with a fresh jitter drawn from `[0, jitter_ms)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Validate retry parameters
    pub fn validate(&self) -> Result<()> {
        if self.backoff_multiplier < 1.0 {
            return Err(Error::config("backoff_multiplier must be at least 1.0"));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(Error::config("base_delay_ms must not exceed max_delay_ms"));
        }
        Ok(())
    }
}

/// Execute an operation with classification, backoff and an attempt budget
///
/// The operation is called at most `max_retries + 1` times. A failure the
/// classifier marks fatal is returned after the first call. Whatever error
/// ends the loop is wrapped in [`Error::RetryExhausted`] with `label` and the
/// number of calls made.
///
/// # Example
///
/// ```no_run
/// use beejobs::error::Result;
/// use beejobs::utils::retry::{with_retry, RetryConfig};
///
/// async fn fetch_page() -> Result<String> {
///     Ok("<html></html>".to_string())
/// }
///
/// # async fn example() -> Result<()> {
/// let config = RetryConfig::default();
/// let html = with_retry(&config, "fetch page", || fetch_page()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let total = config.max_retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(label, attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                let transient = classify(&e) == Classification::Transient;

                if transient && attempt < config.max_retries {
                    let delay = config.backoff_delay(attempt);
                    warn!(
                        label,
                        attempt = attempt + 1,
                        total,
                        delay_ms = delay.as_millis() as u64,
                        kind = %e.kind(),
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                let attempts = attempt + 1;
                if transient {
                    error!(label, attempts, error = %e, "All attempts failed");
                } else {
                    error!(label, attempts, error = %e, "Non-retryable error encountered");
                }

                return Err(Error::RetryExhausted {
                    label: label.to_string(),
                    attempts,
                    source: Box::new(e),
                });
            }
        }
    }
}

/// [`with_retry`] with per-call overrides
pub async fn with_retry_override<T, F, Fut>(
    config: &RetryConfig,
    overrides: &RetryOverride,
    label: &str,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let merged = config.merged(overrides);
    with_retry(&merged, label, operation).await
}

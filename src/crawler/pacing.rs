//! Randomized delays between requests
//!
//! Fixed intervals are an easy bot signature; every wait is drawn uniformly
//! from a configured range.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Which gap in the crawl is being paced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceKind {
    BetweenDetailVisits,
    BetweenPages,
}

/// Delay ranges in milliseconds, bounds inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub detail_min_ms: u64,
    pub detail_max_ms: u64,
    pub page_min_ms: u64,
    pub page_max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            detail_min_ms: 1000,
            detail_max_ms: 3000,
            page_min_ms: 2000,
            page_max_ms: 5000,
        }
    }
}

impl PacingConfig {
    /// No waiting at all, for tests and local targets
    pub fn disabled() -> Self {
        Self {
            detail_min_ms: 0,
            detail_max_ms: 0,
            page_min_ms: 0,
            page_max_ms: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.detail_min_ms > self.detail_max_ms {
            return Err(Error::config("pacing.detail_min_ms exceeds detail_max_ms"));
        }
        if self.page_min_ms > self.page_max_ms {
            return Err(Error::config("pacing.page_min_ms exceeds page_max_ms"));
        }
        Ok(())
    }

    fn range(&self, kind: PaceKind) -> (u64, u64) {
        match kind {
            PaceKind::BetweenDetailVisits => (self.detail_min_ms, self.detail_max_ms),
            PaceKind::BetweenPages => (self.page_min_ms, self.page_max_ms),
        }
    }
}

/// Sleeps for a random duration within the range configured for each gap
#[derive(Debug, Clone, Default)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// Draw the next delay for `kind`
    pub fn delay(&self, kind: PaceKind) -> Duration {
        let (min, max) = self.config.range(kind);
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    pub async fn wait(&self, kind: PaceKind) {
        let delay = self.delay(kind);
        if delay.is_zero() {
            return;
        }
        tracing::debug!(?kind, delay_ms = delay.as_millis() as u64, "Pacing");
        tokio::time::sleep(delay).await;
    }
}

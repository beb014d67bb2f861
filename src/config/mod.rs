//! Configuration management for the beejobs crawler
//!
//! Configuration is loaded from a TOML file or from `BEEJOBS_*` environment
//! variables; anything not given falls back to [`Config::default`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::crawler::pacing::PacingConfig;
use crate::crawler::stealth::StealthConfig;
use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler configuration
    pub crawler: CrawlerConfig,

    /// Backoff and attempt budget shared by every crawl step
    pub retry: RetryConfig,

    /// Randomized waits between requests
    pub pacing: PacingConfig,

    /// Session fingerprint settings
    pub stealth: StealthConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Listings site root, without trailing path
    pub base_url: String,

    /// Default location searched when none is given
    pub location: String,

    /// Default number of result pages per crawl
    pub max_pages: u32,

    /// Request rate floor (requests per second)
    pub rate_limit: u32,

    /// Listing page navigation timeout
    pub navigation_timeout_ms: u64,

    /// Wait for the listing container after navigation
    pub render_timeout_ms: u64,

    /// Detail page navigation timeout
    pub detail_timeout_ms: u64,

    /// Descriptions are cut to this many characters
    pub description_max_chars: usize,

    /// Where to write snapshots of pages that failed to render
    pub debug_dir: Option<PathBuf>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.indeed.com"),
            location: String::from("remote"),
            max_pages: 3,
            rate_limit: 2,
            navigation_timeout_ms: 30_000,
            render_timeout_ms: 15_000,
            detail_timeout_ms: 15_000,
            description_max_chars: 2000,
            debug_dir: None,
        }
    }
}

impl CrawlerConfig {
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    #[must_use]
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    #[must_use]
    pub fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/jobs.db"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("BEEJOBS_BASE_URL") {
            config.crawler.base_url = base_url;
        }
        if let Ok(location) = std::env::var("BEEJOBS_LOCATION") {
            config.crawler.location = location;
        }
        if let Some(max_pages) = env_parse("BEEJOBS_MAX_PAGES") {
            config.crawler.max_pages = max_pages;
        }
        if let Some(rate_limit) = env_parse("BEEJOBS_RATE_LIMIT") {
            config.crawler.rate_limit = rate_limit;
        }
        if let Ok(debug_dir) = std::env::var("BEEJOBS_DEBUG_DIR") {
            config.crawler.debug_dir = Some(PathBuf::from(debug_dir));
        }

        if let Some(max_retries) = env_parse("BEEJOBS_MAX_RETRIES") {
            config.retry.max_retries = max_retries;
        }
        if let Some(enabled) = env_parse("BEEJOBS_STEALTH") {
            config.stealth.enabled = enabled;
        }

        if let Ok(sqlite_path) = std::env::var("BEEJOBS_SQLITE_PATH") {
            config.database.sqlite_path = PathBuf::from(sqlite_path);
        }

        if let Ok(level) = std::env::var("BEEJOBS_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("BEEJOBS_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// File if given, environment otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.crawler.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.crawler.base_url))?;

        if self.crawler.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.crawler.navigation_timeout_ms == 0 || self.crawler.detail_timeout_ms == 0 {
            anyhow::bail!("navigation timeouts must be greater than 0");
        }

        if self.crawler.description_max_chars == 0 {
            anyhow::bail!("description_max_chars must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be `text` or `json`");
        }

        self.retry.validate()?;
        self.pacing.validate()?;

        Ok(())
    }
}

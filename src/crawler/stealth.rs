//! Anti-detection preparation of a fresh browser session
//!
//! All fingerprint policy lives here so it can be tuned or switched off
//! without touching the crawl loop. None of this guarantees evasion; it only
//! removes the trivial automation tells.

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};

use crate::crawler::session::{BrowserSession, Viewport};
use crate::error::Result;
use crate::utils::error::SessionError;

/// Pool of realistic User-Agent strings for rotation
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Script that hides the usual headless-browser markers
pub const STEALTH_INIT_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = window.chrome || { runtime: {} };
const originalQuery = window.navigator.permissions.query;
window.navigator.permissions.query = (parameters) =>
  parameters.name === 'notifications'
    ? Promise.resolve({ state: Notification.permission })
    : originalQuery(parameters);
"#;

/// Stealth settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Apply stealth preparation at all
    pub enabled: bool,

    pub viewport_width: u32,

    pub viewport_height: u32,

    /// Accept-Language header value
    pub accept_language: String,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            viewport_width: 1366,
            viewport_height: 768,
            accept_language: String::from("en-US,en;q=0.9"),
        }
    }
}

/// Build conventional top-level navigation headers
///
/// User-Agent is set separately through the session so it can rotate.
///
/// # Examples
///
/// ```
/// use beejobs::crawler::stealth::build_browsing_headers;
///
/// let headers = build_browsing_headers("en-US,en;q=0.9").unwrap();
/// assert!(headers.contains_key("sec-fetch-mode"));
/// ```
pub fn build_browsing_headers(accept_language: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(accept_language)
            .map_err(|e| SessionError::InvalidHeader(format!("accept-language: {e}")))?,
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));

    // Sec-Fetch headers for modern browser compatibility
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    Ok(headers)
}

/// Prepares sessions before their first navigation
#[derive(Debug, Clone, Default)]
pub struct StealthConfigurator {
    config: StealthConfig,
}

impl StealthConfigurator {
    pub fn new(config: StealthConfig) -> Self {
        Self { config }
    }

    /// Get a random user agent from the pool
    pub fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
    }

    /// Apply identity, viewport, marker suppression and headers to `session`
    pub async fn prepare(&self, session: &dyn BrowserSession) -> Result<()> {
        if !self.config.enabled {
            tracing::debug!("Stealth preparation disabled");
            return Ok(());
        }

        let user_agent = self.random_user_agent();
        let headers = build_browsing_headers(&self.config.accept_language)?;
        let viewport = Viewport {
            width: self.config.viewport_width,
            height: self.config.viewport_height,
        };

        session.set_user_agent(user_agent).await?;
        session.set_viewport(viewport).await?;
        session.add_init_script(STEALTH_INIT_SCRIPT).await?;
        session.set_extra_headers(headers).await?;

        tracing::debug!(
            user_agent,
            width = viewport.width,
            height = viewport.height,
            "Session prepared"
        );
        Ok(())
    }
}

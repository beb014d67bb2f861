//! Browser session abstraction
//!
//! The crawl engine never talks to a browser or HTTP client directly; it
//! drives a [`BrowserSession`]. Two implementations live here:
//!
//! - [`HttpSession`]: a reqwest-backed session with rate limiting, cookie
//!   persistence and header spoofing. Documents are static, so a selector
//!   that is absent after navigation fails immediately.
//! - [`MockBrowserSession`]: a scripted in-memory session for tests.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::utils::error::SessionError;

/// When navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle0,
    #[default]
    NetworkIdle2,
}

/// Options for [`BrowserSession::goto`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

impl NavigateOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            wait_until: WaitUntil::default(),
            timeout,
        }
    }
}

/// Browser viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Capabilities the crawl engine needs from a browser
///
/// A crawl takes ownership of its session and closes it when done. Methods
/// take `&self`, so implementations keep page state behind a lock.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open the page all subsequent calls act on
    async fn new_page(&self) -> Result<()>;

    /// Navigate the page to `url`
    async fn goto(&self, url: &str, options: NavigateOptions) -> Result<()>;

    /// Serialized rendered document of the current page
    async fn content(&self) -> Result<String>;

    /// Wait until `selector` matches in the current document
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn set_user_agent(&self, user_agent: &str) -> Result<()>;

    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Headers sent with every subsequent navigation
    async fn set_extra_headers(&self, headers: HeaderMap) -> Result<()>;

    /// Script evaluated in every new document before page scripts run
    async fn add_init_script(&self, script: &str) -> Result<()>;

    /// Capture of the current page, for debugging failed extractions
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Release the session; calling it again is a no-op
    async fn close(&self) -> Result<()>;
}

/// Run `f` against the parsed document of the current page
///
/// This is the session's `evaluate` capability: extraction code reads the
/// rendered DOM through `f` and returns plain values.
pub async fn evaluate<T, F>(session: &dyn BrowserSession, f: F) -> Result<T>
where
    F: FnOnce(&Html) -> T,
{
    let html = session.content().await?;
    let document = Html::parse_document(&html);
    Ok(f(&document))
}

/// Whether `selector` matches anything in `html`
pub fn document_matches(html: &str, selector: &str) -> Result<bool> {
    let selector = Selector::parse(selector)
        .map_err(|e| SessionError::InvalidSelector(format!("{selector}: {e:?}")))?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::other("browser session state lock poisoned"))
}

// ============================================================================
// HTTP Implementation
// ============================================================================

#[derive(Debug, Default)]
struct HttpPageState {
    page_open: bool,
    closed: bool,
    user_agent: Option<String>,
    headers: HeaderMap,
    viewport: Option<Viewport>,
    init_scripts: Vec<String>,
    url: Option<String>,
    document: Option<String>,
}

/// Browser session over plain HTTP
pub struct HttpSession {
    /// HTTP client with compression and cookie persistence
    client: Client,

    /// Floor on request frequency, independent of pacing
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    state: Mutex<HttpPageState>,
}

impl HttpSession {
    /// Create a new session
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum number of requests per second
    ///
    /// # Errors
    ///
    /// Returns `Error::Http` if the HTTP client cannot be created
    pub fn new(requests_per_second: u32) -> Result<Self> {
        let client = Client::builder().gzip(true).cookie_store(true).build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            state: Mutex::new(HttpPageState::default()),
        })
    }

    /// URL of the current document, if any
    pub fn current_url(&self) -> Option<String> {
        lock(&self.state).ok().and_then(|s| s.url.clone())
    }

    /// Viewport last requested through [`BrowserSession::set_viewport`]
    pub fn viewport(&self) -> Option<Viewport> {
        lock(&self.state).ok().and_then(|s| s.viewport)
    }

    fn request_headers(&self) -> Result<HeaderMap> {
        let state = lock(&self.state)?;
        if state.closed {
            return Err(SessionError::Closed.into());
        }
        if !state.page_open {
            return Err(SessionError::NoPage.into());
        }

        let mut headers = state.headers.clone();
        // the client negotiates only the encodings it can decode
        headers.remove(ACCEPT_ENCODING);
        if let Some(ua) = &state.user_agent {
            let value = HeaderValue::from_str(ua)
                .map_err(|e| SessionError::InvalidHeader(format!("user-agent: {e}")))?;
            headers.insert(USER_AGENT, value);
        }
        Ok(headers)
    }

    async fn fetch_document(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let response = self.client.get(url).headers(headers).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Session(SessionError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: 0,
                })
            } else {
                Error::Session(SessionError::Network(e.to_string()))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SessionError::RateLimited.into());
        }
        if status.is_server_error() {
            return Err(SessionError::Server(status.as_u16()).into());
        }
        if !status.is_success() {
            // a browser still renders error pages; leave the verdict to the extractors
            tracing::debug!(url = %url, status = %status, "Non-success status, keeping document");
        }

        response
            .text()
            .await
            .map_err(|e| SessionError::Network(e.to_string()).into())
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn new_page(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.closed {
            return Err(SessionError::Closed.into());
        }
        state.page_open = true;
        Ok(())
    }

    async fn goto(&self, url: &str, options: NavigateOptions) -> Result<()> {
        let headers = self.request_headers()?;

        self.rate_limiter.until_ready().await;

        tracing::debug!(url = %url, wait_until = ?options.wait_until, "Navigating");

        let body = match tokio::time::timeout(options.timeout, self.fetch_document(url, headers))
            .await
        {
            Ok(Err(Error::Session(SessionError::NavigationTimeout { .. }))) | Err(_) => {
                return Err(SessionError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: options.timeout.as_millis() as u64,
                }
                .into());
            }
            Ok(result) => result?,
        };

        let mut state = lock(&self.state)?;
        state.url = Some(url.to_string());
        state.document = Some(body);
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let state = lock(&self.state)?;
        if state.closed {
            return Err(SessionError::Closed.into());
        }
        state
            .document
            .clone()
            .ok_or_else(|| SessionError::NoDocument.into())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let html = self.content().await?;
        if document_matches(&html, selector)? {
            Ok(())
        } else {
            Err(SessionError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
            .into())
        }
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        lock(&self.state)?.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        lock(&self.state)?.viewport = Some(viewport);
        Ok(())
    }

    async fn set_extra_headers(&self, headers: HeaderMap) -> Result<()> {
        lock(&self.state)?.headers.extend(headers);
        Ok(())
    }

    async fn add_init_script(&self, script: &str) -> Result<()> {
        // no script engine over plain HTTP; kept so the session mirrors a browser
        lock(&self.state)?.init_scripts.push(script.to_string());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.content().await.map(String::into_bytes)
    }

    async fn close(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        state.closed = true;
        state.page_open = false;
        state.document = None;
        Ok(())
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// Scripted response for one navigation
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Navigation succeeds and renders this HTML
    Page(String),
    /// Navigation fails with this error
    Fail(SessionError),
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, VecDeque<MockResponse>>,
    page_open: bool,
    closed: bool,
    close_calls: usize,
    user_agent: Option<String>,
    viewport: Option<Viewport>,
    headers: HeaderMap,
    init_scripts: Vec<String>,
    document: Option<String>,
    visits: Vec<String>,
}

/// In-memory browser session driven by scripted routes
///
/// Each URL maps to a queue of responses. A queue is consumed front to back
/// and its last entry repeats. Unrouted URLs render an empty document.
///
/// Clones share state, so a test can hand one clone to a crawl and inspect
/// visits through another.
#[derive(Debug, Default, Clone)]
pub struct MockBrowserSession {
    state: Arc<Mutex<MockState>>,
}

impl MockBrowserSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered page to the queue for `url`
    pub fn route(&self, url: &str, html: impl Into<String>) -> &Self {
        self.push(url, MockResponse::Page(html.into()))
    }

    /// Append a navigation failure to the queue for `url`
    pub fn route_failure(&self, url: &str, error: SessionError) -> &Self {
        self.push(url, MockResponse::Fail(error))
    }

    fn push(&self, url: &str, response: MockResponse) -> &Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .routes
                .entry(url.to_string())
                .or_default()
                .push_back(response);
        }
        self
    }

    /// Every URL navigated to, in order
    pub fn visits(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.visits.clone())
            .unwrap_or_default()
    }

    /// Number of navigations to `url`
    pub fn visit_count(&self, url: &str) -> usize {
        self.visits().iter().filter(|v| v.as_str() == url).count()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(false)
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().map(|s| s.close_calls).unwrap_or(0)
    }

    pub fn user_agent(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.user_agent.clone())
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state.lock().ok().and_then(|s| s.viewport)
    }

    pub fn extra_headers(&self) -> HeaderMap {
        self.state
            .lock()
            .map(|s| s.headers.clone())
            .unwrap_or_default()
    }

    pub fn init_scripts(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.init_scripts.clone())
            .unwrap_or_default()
    }

    fn next_response(state: &mut MockState, url: &str) -> MockResponse {
        match state.routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| MockResponse::Page(String::new())),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| MockResponse::Page(String::new())),
            None => MockResponse::Page("<html><head></head><body></body></html>".to_string()),
        }
    }
}

#[async_trait]
impl BrowserSession for MockBrowserSession {
    async fn new_page(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.closed {
            return Err(SessionError::Closed.into());
        }
        state.page_open = true;
        Ok(())
    }

    async fn goto(&self, url: &str, _options: NavigateOptions) -> Result<()> {
        let mut state = lock(&self.state)?;
        if state.closed {
            return Err(SessionError::Closed.into());
        }
        if !state.page_open {
            return Err(SessionError::NoPage.into());
        }

        state.visits.push(url.to_string());
        match Self::next_response(&mut state, url) {
            MockResponse::Page(html) => {
                state.document = Some(html);
                Ok(())
            }
            MockResponse::Fail(err) => Err(err.into()),
        }
    }

    async fn content(&self) -> Result<String> {
        let state = lock(&self.state)?;
        if state.closed {
            return Err(SessionError::Closed.into());
        }
        state
            .document
            .clone()
            .ok_or_else(|| SessionError::NoDocument.into())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let html = self.content().await?;
        if document_matches(&html, selector)? {
            Ok(())
        } else {
            Err(SessionError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }
            .into())
        }
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        lock(&self.state)?.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        lock(&self.state)?.viewport = Some(viewport);
        Ok(())
    }

    async fn set_extra_headers(&self, headers: HeaderMap) -> Result<()> {
        lock(&self.state)?.headers.extend(headers);
        Ok(())
    }

    async fn add_init_script(&self, script: &str) -> Result<()> {
        lock(&self.state)?.init_scripts.push(script.to_string());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.content().await.map(String::into_bytes)
    }

    async fn close(&self) -> Result<()> {
        let mut state = lock(&self.state)?;
        state.closed = true;
        state.page_open = false;
        state.close_calls += 1;
        Ok(())
    }
}

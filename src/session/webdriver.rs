//! Remote browser backend speaking the W3C WebDriver protocol
//!
//! Each session is a real browser session on a WebDriver endpoint (chromedriver,
//! geckodriver, or a Selenium grid). Pages are rendered by the browser and read back
//! as page source, so script-built content is visible to the extractors.

use crate::session::page::PageSnapshot;
use crate::session::traits::{Backend, FetchError, Session};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Selector;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// W3C response envelope
#[derive(Debug, Deserialize)]
struct Reply<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Backend that opens browser sessions on a WebDriver endpoint
pub struct WebDriverBackend {
    client: Client,
    endpoint: String,
    capabilities: Value,
    poll_interval: Duration,
}

impl WebDriverBackend {
    /// Creates a backend for `endpoint`, e.g. `http://localhost:4444`
    pub fn new(client: Client, endpoint: &str, browser: &str, headless: bool) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            capabilities: capabilities(browser, headless),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides how often `wait_for` re-reads the page source
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Capabilities for a new session
fn capabilities(browser: &str, headless: bool) -> Value {
    let browser = browser.to_ascii_lowercase();
    let mut always_match = json!({ "browserName": browser });

    if headless {
        match browser.as_str() {
            "chrome" | "chromium" => {
                always_match["goog:chromeOptions"] = json!({ "args": ["--headless=new"] });
            }
            "firefox" => {
                always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
            }
            "msedge" | "edge" => {
                always_match["ms:edgeOptions"] = json!({ "args": ["--headless=new"] });
            }
            _ => {}
        }
    }

    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Turns a non-success WebDriver reply into a fetch error
async fn reply_error(url: &str, response: reqwest::Response) -> FetchError {
    let status = response.status().as_u16();
    let detail = response
        .json::<Reply<WireError>>()
        .await
        .map(|r| format!("{}: {}", r.value.error, r.value.message))
        .unwrap_or_default();

    // Bare 502/503 from a proxy or grid that is not ready yet stays a status error,
    // which is transient
    if detail.is_empty() {
        FetchError::Status {
            url: url.to_string(),
            status,
        }
    } else {
        FetchError::Protocol(format!("{} ({}): {}", url, status, detail))
    }
}

#[async_trait]
impl Backend for WebDriverBackend {
    fn name(&self) -> &'static str {
        "webdriver"
    }

    async fn connect(&self) -> Result<Box<dyn Session>, FetchError> {
        let url = format!("{}/session", self.endpoint);
        tracing::debug!("Opening WebDriver session at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&self.capabilities)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, e))?;

        if !response.status().is_success() {
            return Err(reply_error(&url, response).await);
        }

        let reply: Reply<NewSession> = response
            .json()
            .await
            .map_err(|e| FetchError::Protocol(format!("malformed new session reply: {}", e)))?;

        tracing::debug!("WebDriver session {} opened", reply.value.session_id);

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.endpoint, reply.value.session_id),
            current_url: None,
            poll_interval: self.poll_interval,
            closed: false,
        }))
    }
}

/// A live browser session
pub struct WebDriverSession {
    client: Client,
    base: String,
    current_url: Option<Url>,
    poll_interval: Duration,
    closed: bool,
}

impl WebDriverSession {
    async fn page_source(&self) -> Result<String, FetchError> {
        let url = format!("{}/source", self.base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, e))?;

        if !response.status().is_success() {
            return Err(reply_error(&url, response).await);
        }

        let reply: Reply<String> = response
            .json()
            .await
            .map_err(|e| FetchError::Protocol(format!("malformed page source reply: {}", e)))?;
        Ok(reply.value)
    }

    fn snapshot(&self, html: String) -> Result<PageSnapshot, FetchError> {
        let url = self.current_url.clone().ok_or(FetchError::NoPage)?;
        Ok(PageSnapshot::new(url, html))
    }
}

#[async_trait]
impl Session for WebDriverSession {
    async fn load(&mut self, url: &Url) -> Result<PageSnapshot, FetchError> {
        let command = format!("{}/url", self.base);
        tracing::debug!("Navigating to {}", url);

        let response = self
            .client
            .post(&command)
            .json(&json!({ "url": url.as_str() }))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        if !response.status().is_success() {
            return Err(reply_error(url.as_str(), response).await);
        }

        self.current_url = Some(url.clone());
        let html = self.page_source().await?;
        self.snapshot(html)
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<PageSnapshot, FetchError> {
        let parsed =
            Selector::parse(selector).map_err(|_| FetchError::Selector(selector.to_string()))?;
        if self.current_url.is_none() {
            return Err(FetchError::NoPage);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let snapshot = self.snapshot(self.page_source().await?)?;
            if snapshot.contains(&parsed) {
                return Ok(snapshot);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FetchError::ElementWait {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let response = self
            .client
            .delete(&self.base)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&self.base, e))?;

        if !response.status().is_success() {
            return Err(reply_error(&self.base, response).await);
        }
        Ok(())
    }
}

//! Plain HTTP backend
//!
//! Pages are fetched with reqwest and read exactly as served. Opening a session makes
//! no request; every session shares the backend's connection pool.

use crate::config::UserAgentConfig;
use crate::session::page::PageSnapshot;
use crate::session::traits::{Backend, FetchError, Session};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::Selector;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Upper bound for every request made with this client
///
/// # Example
///
/// ```no_run
/// use reel_tracks::config::UserAgentConfig;
/// use reel_tracks::session::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ReelTracks".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Backend that opens plain HTTP sessions
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn connect(&self) -> Result<Box<dyn Session>, FetchError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            current: None,
        }))
    }
}

/// Session over a plain HTTP client
pub struct HttpSession {
    client: Client,
    current: Option<PageSnapshot>,
}

#[async_trait]
impl Session for HttpSession {
    async fn load(&mut self, url: &Url) -> Result<PageSnapshot, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let snapshot = PageSnapshot::new(final_url, body);
        self.current = Some(snapshot.clone());
        Ok(snapshot)
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<PageSnapshot, FetchError> {
        let parsed =
            Selector::parse(selector).map_err(|_| FetchError::Selector(selector.to_string()))?;
        let current = self.current.as_ref().ok_or(FetchError::NoPage)?;

        // Served markup never changes, so one look is enough
        if current.contains(&parsed) {
            Ok(current.clone())
        } else {
            Err(FetchError::ElementWait {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.current = None;
        Ok(())
    }
}

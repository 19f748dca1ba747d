//! Session traits and fetch error types
//!
//! A backend opens sessions; a session loads pages and waits for elements. The
//! plain HTTP fetcher and the remote browser both implement the same pair of traits,
//! so the extractors never see which one they are talking to.

use crate::session::page::PageSnapshot;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while opening sessions or loading pages
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Element '{selector}' not present within {timeout:?}")]
    ElementWait { selector: String, timeout: Duration },

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("WebDriver protocol error: {0}")]
    Protocol(String),

    #[error("No page has been loaded in this session")]
    NoPage,
}

impl FetchError {
    /// Classifies a reqwest error for `url`
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_decode() {
            Self::Protocol(format!("{}: {}", url, error))
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }

    /// Returns true for failures worth retrying: connection refused, DNS failure,
    /// timeouts and 5xx answers
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A live fetch or render context
#[async_trait]
pub trait Session: Send {
    /// Loads a page and returns its markup
    async fn load(&mut self, url: &url::Url) -> Result<PageSnapshot, FetchError>;

    /// Waits until `selector` matches on the current page
    ///
    /// Static backends check the loaded markup once; render backends poll until the
    /// element appears or `timeout` elapses.
    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<PageSnapshot, FetchError>;

    /// Terminates the session. Called once, by `SessionFactory::release`.
    async fn close(&mut self) -> Result<(), FetchError>;
}

/// Something sessions can be opened against
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Makes a single attempt at opening a session
    async fn connect(&self) -> Result<Box<dyn Session>, FetchError>;
}

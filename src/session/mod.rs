//! Session acquisition with bounded retry
//!
//! [`SessionFactory`] opens sessions against a [`Backend`] and retries transient
//! failures with a fixed or exponential delay. Every session it hands out must be
//! given back through [`SessionFactory::release`], on success and error paths alike.

mod http;
mod page;
mod traits;
mod webdriver;

pub use http::{build_http_client, HttpBackend, HttpSession};
pub use page::{element_text, Document, PageSnapshot};
pub use traits::{Backend, FetchError, Session};
pub use webdriver::{WebDriverBackend, WebDriverSession};

use crate::config::{BackendKind, Backoff, Config, SessionConfig};
use crate::{ConfigError, ReelError};
use std::sync::Arc;
use std::time::Duration;

/// Longest delay exponential backoff will grow to
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// How often and how patiently session acquisition is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.retry_delay(),
            backoff: config.backoff,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor).min(MAX_BACKOFF)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Issues sessions from a backend
#[derive(Clone)]
pub struct SessionFactory {
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
}

impl SessionFactory {
    pub fn new(backend: Arc<dyn Backend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Builds the backend selected in the configuration
    pub fn from_config(config: &Config) -> Result<Self, ReelError> {
        let session = &config.session;
        let client = build_http_client(&config.user_agent, session.request_timeout())?;

        let backend: Arc<dyn Backend> = match session.backend {
            BackendKind::Http => Arc::new(HttpBackend::new(client)),
            BackendKind::Webdriver => {
                let endpoint = session.endpoint.as_deref().ok_or_else(|| {
                    ConfigError::Validation(
                        "the webdriver backend requires an endpoint".to_string(),
                    )
                })?;
                Arc::new(WebDriverBackend::new(
                    client,
                    endpoint,
                    &session.browser,
                    session.headless,
                ))
            }
        };

        Ok(Self::new(backend, RetryPolicy::from_config(session)))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Opens a session, retrying transient failures
    ///
    /// Non-transient failures (a broker rejecting the requested capabilities, a 4xx
    /// answer) are not retried.
    ///
    /// # Returns
    ///
    /// * `Ok(session)` - A live session; pass it to [`release`](Self::release) when done
    /// * `Err(ReelError::SessionUnavailable)` - Attempts exhausted or a permanent failure
    pub async fn acquire(&self) -> Result<Box<dyn Session>, ReelError> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=max_attempts {
            match self.backend.connect().await {
                Ok(session) => {
                    if attempt > 1 {
                        tracing::info!(
                            "{} session acquired on attempt {}/{}",
                            self.backend.name(),
                            attempt,
                            max_attempts
                        );
                    }
                    return Ok(session);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        "{} session attempt {}/{} failed: {}; retrying in {:?}",
                        self.backend.name(),
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    last_error = e.to_string();
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "{} session attempt {}/{} failed: {}",
                        self.backend.name(),
                        attempt,
                        max_attempts,
                        e
                    );
                    return Err(ReelError::SessionUnavailable {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
            }
        }

        Err(ReelError::SessionUnavailable {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Closes a session. Failures are logged, never returned.
    pub async fn release(&self, mut session: Box<dyn Session>) {
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close {} session: {}", self.backend.name(), e);
        }
    }
}

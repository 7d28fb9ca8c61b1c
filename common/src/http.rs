//! Outbound HTTP fetch seam.
//!
//! Every scraper in the workspace reads remote documents through
//! [`HttpFetch`], so tests can substitute canned bodies for live pages.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::time::{constants, DurationExt};

/// Browser identification sent with every request. Some quote pages reject
/// default client identifiers.
pub const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
);

/// Trait for fetching remote documents as text.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// GET `url` and return the body.
    async fn get_text(&self, url: &str) -> FetchResult<String>;
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: constants::fetch_timeout().as_std(),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// [`HttpFetch`] backed by a shared `reqwest` client.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Build a client with the given configuration.
    pub fn new(config: &HttpConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::ConfigurationError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get_text(&self, url: &str) -> FetchResult<String> {
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Canned fetcher for testing.
///
/// URLs without a registered body fail with a transport error, which is how
/// an unreachable host looks to callers.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct StaticFetch {
    bodies: dashmap::DashMap<String, String>,
    hits: dashmap::DashMap<String, usize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticFetch {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body for `url`.
    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// Number of times `url` was requested.
    pub fn hits(&self, url: &str) -> usize {
        self.hits.get(url).map(|h| *h).unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl HttpFetch for StaticFetch {
    async fn get_text(&self, url: &str) -> FetchResult<String> {
        *self.hits.entry(url.to_string()).or_insert(0) += 1;
        self.bodies
            .get(url)
            .map(|b| b.clone())
            .ok_or_else(|| FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

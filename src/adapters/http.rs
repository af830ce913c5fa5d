use crate::domain::ports::{ConfigProvider, MarkupFetcher};
use crate::utils::error::{EtlError, FetchError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("olympiad-etl/", env!("CARGO_PKG_VERSION"));

/// Retries after the first attempt, with the delay doubling each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Fetches listing pages over HTTP with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        Self::with_headers(timeout, retry, DEFAULT_USER_AGENT, &HashMap::new())
    }

    pub fn with_headers(
        timeout: Duration,
        retry: RetryPolicy,
        user_agent: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                EtlError::InvalidConfigValueError {
                    field: "fetch.headers".to_string(),
                    value: key.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value =
                HeaderValue::from_str(value).map_err(|e| EtlError::InvalidConfigValueError {
                    field: format!("fetch.headers.{}", key),
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(default_headers)
            .build()
            .map_err(|e| EtlError::ConfigError {
                message: format!("could not build HTTP client: {}", e),
            })?;

        Ok(Self { client, retry })
    }

    pub fn from_config<C: ConfigProvider>(
        config: &C,
        user_agent: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Self> {
        let retry = RetryPolicy {
            max_retries: config.retry_attempts(),
            base_delay: config.retry_delay(),
        };
        Self::with_headers(config.request_timeout(), retry, user_agent, headers)
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchError> {
        let to_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::timeout(url, e.to_string())
            } else if e.is_builder() || e.is_decode() || e.is_redirect() {
                FetchError::request(url, e.to_string())
            } else {
                FetchError::network(url, e.to_string())
            }
        };

        let response = self.client.get(url).send().await.map_err(to_fetch_error)?;
        let status = response.status();
        tracing::debug!(url, status = status.as_u16(), "listing page response");

        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        response.text().await.map_err(to_fetch_error)
    }
}

#[async_trait]
impl MarkupFetcher for HttpFetcher {
    async fn fetch_markup(&self, url: &str) -> std::result::Result<String, FetchError> {
        let mut attempt = 0;
        let mut delay = self.retry.base_delay;

        loop {
            match self.fetch_once(url).await {
                Ok(markup) => return Ok(markup),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        url,
                        attempt,
                        error = %err,
                        "transient fetch failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

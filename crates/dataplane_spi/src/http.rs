//! Shared outbound HTTP client for data-plane extensions

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{Result, SpiError};

/// Configuration for the shared HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Delay before the first retry, doubled on every further retry
    pub retry_base_delay_ms: u64,

    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 60_000,
            max_retries: 2,
            retry_base_delay_ms: 500,
            user_agent: format!("dataplane/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Backoff before the given retry (1-based)
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(SpiError::config("connect_timeout_ms must be greater than zero"));
        }
        if self.request_timeout_ms == 0 {
            return Err(SpiError::config("request_timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}

/// HTTP client shared by all extensions of a data plane.
///
/// Requests are described by a closure so they can be rebuilt and resent
/// when a transient failure is retried.
#[derive(Debug, Clone)]
pub struct DataPlaneHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl DataPlaneHttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Send a request, retrying connect failures, timeouts and gateway errors
    pub async fn execute<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let max_retries = self.config.max_retries;
        let mut retries = 0;

        loop {
            if retries > 0 {
                let delay = self.config.retry_delay(retries);
                info!("HTTP retry {} of {} in {:?}", retries, max_retries, delay);
                tokio::time::sleep(delay).await;
            }

            match build(&self.client).send().await {
                Ok(response) if is_retryable_status(response.status()) && retries < max_retries => {
                    warn!(
                        "HTTP request to {} returned {} (attempt {})",
                        response.url(),
                        response.status(),
                        retries + 1
                    );
                }
                Ok(response) => {
                    debug!(
                        "HTTP request to {} completed with status {}",
                        response.url(),
                        response.status()
                    );
                    return Ok(response);
                }
                Err(e) if is_recoverable(&e) && retries < max_retries => {
                    warn!("HTTP request failed (attempt {}): {}", retries + 1, e);
                }
                Err(e) => {
                    error!("HTTP request failed permanently: {}", e);
                    return Err(SpiError::Http(e));
                }
            }

            retries += 1;
        }
    }
}

fn is_recoverable(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout()
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

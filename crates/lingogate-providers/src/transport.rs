//! HTTP transport with bounded retry and exponential backoff.
//!
//! Only network-layer failures (connect, timeout, dropped connection) are
//! retried. A received non-2xx status is final and surfaces immediately.
//! Both the transport and the sleep are traits so tests can script
//! failures and assert the exact waits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lingogate_core::config::schema::NetworkConfig;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::ProviderError;
use crate::request::{ProviderRequest, ProviderResponse};

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// A single failed HTTP exchange.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS handshake failure, …
    #[error("could not connect: {0}")]
    Connect(String),

    /// No response within the per-attempt budget.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other failure before a complete response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body is not JSON.
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether another attempt might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::Timeout(_) | TransportError::Network(_)
        )
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

// ─────────────────────────────────────────────
// Transport + sleep seams
// ─────────────────────────────────────────────

/// Executes one HTTP request, once.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, TransportError>;
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleep; only suspends the calling task.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `reqwest`-backed transport. The client is shared and connection-pooled.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(TransportError::from_reqwest)?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(ProviderResponse {
            status: status.as_u16(),
            body,
        })
    }
}

// ─────────────────────────────────────────────
// Retry policy
// ─────────────────────────────────────────────

/// Attempt budget and backoff curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub initial_backoff: Duration,
    /// Cap on any single wait.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl From<&NetworkConfig> for RetryPolicy {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_secs(config.initial_backoff_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt number `attempt` (2-based; attempt 1 never waits).
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Per-call retry bookkeeping; dropped when `send` returns.
#[derive(Debug, Default)]
struct RetryContext {
    attempt: u32,
    cumulative_wait: Duration,
}

// ─────────────────────────────────────────────
// RetryingTransport
// ─────────────────────────────────────────────

/// Wraps an [`HttpTransport`] with the retry loop.
#[derive(Clone)]
pub struct RetryingTransport {
    inner: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingTransport")
            .field("policy", &self.policy)
            .finish()
    }
}

impl RetryingTransport {
    pub fn new(
        inner: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            inner,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `request`, retrying transient failures per the policy.
    ///
    /// Returns `RetriesExhausted` (carrying the last transport error) once
    /// the budget is spent, or `Transport` for a non-retryable failure.
    pub async fn send(
        &self,
        request: &ProviderRequest,
        timeout: Duration,
    ) -> Result<ProviderResponse, ProviderError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut ctx = RetryContext::default();

        loop {
            ctx.attempt += 1;
            match self.inner.execute(request, timeout).await {
                Ok(response) => {
                    if ctx.attempt > 1 {
                        debug!(
                            url = %request.url,
                            attempt = ctx.attempt,
                            waited_ms = ctx.cumulative_wait.as_millis() as u64,
                            "provider request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() => {
                    if ctx.attempt >= max_attempts {
                        error!(
                            url = %request.url,
                            attempts = ctx.attempt,
                            waited_ms = ctx.cumulative_wait.as_millis() as u64,
                            error = %e,
                            "provider unreachable, giving up"
                        );
                        return Err(ProviderError::RetriesExhausted {
                            attempts: ctx.attempt,
                            last: e,
                        });
                    }
                    let wait = self.policy.backoff_before(ctx.attempt + 1);
                    warn!(
                        url = %request.url,
                        attempt = ctx.attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "transient provider failure, retrying"
                    );
                    ctx.cumulative_wait += wait;
                    self.sleeper.sleep(wait).await;
                }
                Err(e) => {
                    error!(url = %request.url, error = %e, "provider request failed");
                    return Err(ProviderError::Transport(e));
                }
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

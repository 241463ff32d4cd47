//! Retry logic.
//!
//! # Responsibilities
//! - Run one upstream operation up to `max_attempts` times
//! - Retry only on `RateLimited` and `TransportFailure`
//! - Sleep a jittered exponential delay between attempts
//! - Turn a spent budget into `FetchError::Exhausted`

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::upstream::{FetchError, FetchResult, UpstreamError};

/// Bounded retry-on-rate-limit policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Backoff::from_config(config))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Longest time `execute` can take when each attempt is bounded by
    /// `per_attempt`: every attempt times out and every delay hits its ceiling.
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        (1..self.max_attempts).fold(
            per_attempt.saturating_mul(self.max_attempts),
            |total, attempt| total.saturating_add(self.backoff.ceiling(attempt)),
        )
    }

    /// Execute `operation`, retrying retryable upstream failures.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> FetchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                tracing::warn!(
                    kind = %err.kind(),
                    identifier = %err.identifier(),
                    attempt,
                    error = %err,
                    "Upstream call failed, not retryable"
                );
                return Err(FetchError::Upstream(err));
            }

            if attempt >= self.max_attempts {
                tracing::warn!(
                    kind = %err.kind(),
                    identifier = %err.identifier(),
                    attempts = attempt,
                    error = %err,
                    "Retries exhausted"
                );
                return Err(FetchError::Exhausted {
                    kind: err.kind(),
                    identifier: err.identifier().to_string(),
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.backoff.delay(attempt);
            tracing::info!(
                kind = %err.kind(),
                identifier = %err.identifier(),
                attempt,
                delay = ?delay,
                reason = err.label(),
                "Retrying upstream call"
            );
            metrics::record_retry(err.kind());
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

//! Retry with backoff, used for dialing and readiness polling.

use std::future::Future;
use std::time::Duration;

use crate::error::HarnessError;

/// How often, and how far apart, to try an operation that may not be
/// ready yet. Only errors with [`HarnessError::is_retryable`] are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts in total, counting the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Growth factor applied to the backoff after each failure.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Poll at a fixed interval until `budget` is spent.
    pub fn fixed(interval: Duration, budget: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let attempts = (budget.as_millis() / interval_ms).max(1);
        Self {
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
            initial_backoff: interval,
            max_backoff: interval,
            multiplier: 1.0,
        }
    }

    /// Run `operation` until it succeeds, fails for good, or the attempts
    /// run out. `what` names the operation in logs and errors.
    pub async fn execute<F, Fut, T>(&self, what: &str, mut operation: F) -> Result<T, HarnessError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarnessError>>,
    {
        if self.max_attempts == 0 {
            return Err(HarnessError::InvalidArgument(format!("{what}: retry policy allows no attempts")));
        }

        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt >= self.max_attempts {
                tracing::debug!(what, attempt, error = %err, "Giving up");
                return Err(err);
            }
            tracing::debug!(what, attempt, max_attempts = self.max_attempts, error = %err, "Not yet, retrying");

            tokio::time::sleep(backoff).await;
            backoff = backoff.mul_f64(self.multiplier).min(self.max_backoff);
            attempt += 1;
        }
    }
}

//! Per-call deadlines.

use std::future::Future;
use std::time::Duration;

use crate::error::HarnessError;

/// Run `future` under `budget`, reporting `call` if the budget runs out.
pub async fn with_timeout<T>(
    call: &str,
    budget: Duration,
    future: impl Future<Output = Result<T, HarnessError>>,
) -> Result<T, HarnessError> {
    let ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
    tokio::time::timeout(budget, future).await.unwrap_or_else(|_| {
        tracing::debug!(call, budget_ms = ms, "Call deadline elapsed");
        Err(HarnessError::timeout(call, ms))
    })
}

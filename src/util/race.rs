//! Await the first of a signal, a timer, or cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Which contender finished first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    Signal(T),
    TimedOut,
    Canceled,
}

/// Race `signal` against a timer and a cancellation token.
///
/// Cancellation wins ties, then the signal. The losing futures are dropped,
/// so whatever produces the signal must tolerate nobody listening anymore.
pub async fn first_of<T>(
    signal: impl Future<Output = T>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> RaceOutcome<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => RaceOutcome::Canceled,
        value = signal => RaceOutcome::Signal(value),
        _ = tokio::time::sleep(timeout) => RaceOutcome::TimedOut,
    }
}

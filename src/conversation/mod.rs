//! Stream-driven conversation: stage machine, approvals, resume check.

pub mod approvals;
pub mod machine;
pub mod resume;
pub mod state;

pub use approvals::{ApprovalDecision, ApprovalKind, AutoApprover};
pub use machine::{Flow, LoopExit, StageMachine};
pub use resume::ResumeCheck;
pub use state::{ConversationState, Stage};

use std::future::Future;
use std::time::Duration;

use crate::error::HarnessError;
use crate::message_log::MessageLog;
use crate::transport::{drain, EventStream};
use crate::util::timeout::with_timeout;
use crate::validation::ValidationSet;

/// Everything a run accumulates, passed explicitly into each phase.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub validations: ValidationSet,
    pub log: MessageLog,
}

impl RunContext {
    pub fn new<I, S>(checkpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            validations: ValidationSet::new(checkpoints),
            log: MessageLog::new(),
        }
    }
}

/// Open a follow-up call within `timeout`, then drain its acknowledgement.
///
/// Failing to open is fatal for the run. A slow or broken acknowledgement
/// is only logged.
pub(crate) async fn deliver<F>(step: &str, timeout: Duration, open: F) -> Result<(), HarnessError>
where
    F: Future<Output = Result<EventStream, HarnessError>>,
{
    let stream = with_timeout(step, timeout, open)
        .await
        .map_err(|e| HarnessError::could_not_advance(step, e))?;
    if tokio::time::timeout(timeout, drain(stream, step)).await.is_err() {
        tracing::warn!(step, "Acknowledgement still open at timeout, moving on");
    }
    Ok(())
}

//! Second phase: resume the latest task and check the agent kept its context.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::machine::LoopExit;
use super::{deliver, RunContext};
use crate::config::{CallTimeouts, ResumeStage};
use crate::error::HarnessError;
use crate::event::{classify, EventKind, TurnOrigin};
use crate::proto::{ClineSay, InvokeRequest};
use crate::transport::AgentService;
use crate::validation::checkpoint;

pub struct ResumeCheck<'a> {
    service: &'a dyn AgentService,
    stage: &'a ResumeStage,
    timeouts: CallTimeouts,
    delay: Duration,
    resumed_task: Option<String>,
}

impl<'a> ResumeCheck<'a> {
    pub fn new(service: &'a dyn AgentService, stage: &'a ResumeStage, timeouts: CallTimeouts) -> Self {
        Self {
            service,
            stage,
            timeouts,
            delay: Duration::ZERO,
            resumed_task: None,
        }
    }

    /// Wait this long before asking the backend to resume.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn resumed_task(&self) -> Option<&str> {
        self.resumed_task.as_deref()
    }

    pub async fn run(&mut self, ctx: &mut RunContext, cancel: &CancellationToken) -> Result<LoopExit, HarnessError> {
        if !self.delay.is_zero() {
            tracing::info!(delay_ms = self.delay.as_millis() as u64, "Waiting before resume");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(LoopExit::Canceled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        let mut events = self
            .service
            .resume_latest_task()
            .await
            .map_err(|e| HarnessError::could_not_advance("resume the latest task", e))?;

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(LoopExit::Canceled),
                item = events.next() => item,
            };
            let raw = match item {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Resumed stream failed");
                    return Ok(LoopExit::StreamFailed(e.to_string()));
                }
                None => {
                    tracing::info!("Resumed stream ended");
                    return Ok(LoopExit::StreamEnded);
                }
            };

            let mut event = classify(&raw);
            event.seq = ctx.log.append(event.clone());

            match &event.kind {
                EventKind::TurnStarted { task_id, .. } if self.resumed_task.is_none() => {
                    tracing::info!(task_id = %task_id, "Task resumed");
                    self.resumed_task = Some(task_id.clone());
                    ctx.validations.record(checkpoint::RESUME_STARTED, true);
                    deliver(
                        "send resume follow-up",
                        self.timeouts.follow_up,
                        self.service.send_user_input(InvokeRequest::text(self.stage.follow_up.clone())),
                    )
                    .await?;
                }
                EventKind::TurnUpdate(turn)
                    if self.resumed_task.is_some()
                        && turn.origin == TurnOrigin::Committed
                        && matches!(turn.say_kind(), Some(ClineSay::Text | ClineSay::CompletionResult)) =>
                {
                    let text = turn.reply_text();
                    if self.stage.expect.matches(text) {
                        tracing::info!(text, "Resumed task answered coherently");
                        ctx.validations.record(checkpoint::RESUME_COHERENT, true);
                        return Ok(LoopExit::Completed);
                    }
                    tracing::debug!(text, "Reply after resume did not pass the coherence check");
                }
                _ => {}
            }
        }
    }
}

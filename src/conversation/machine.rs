//! The conversation stage machine.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::approvals::AutoApprover;
use super::state::{ConversationState, Stage};
use super::{deliver, RunContext};
use crate::config::{CallTimeouts, Script};
use crate::error::HarnessError;
use crate::event::{classify, ContentTag, Event, EventKind, Role, TurnUpdate};
use crate::proto::cline_message::SayPayload;
use crate::proto::{CheckpointRestoreRequest, ClineAsk, InvokeRequest};
use crate::transport::{AgentService, EventStream};
use crate::util::timeout::with_timeout;
use crate::validation::checkpoint;
use crate::validation::predicates::{command_exec_observed, file_write_observed, is_status_chatter};

/// Placeholder marker for the diff call when no checkpoint exists yet.
const DIFF_PLACEHOLDER_MARKER: i64 = 1;

/// Whether the event loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Why the event loop ended.
#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LoopExit {
    Completed,
    StreamEnded,
    StreamFailed(String),
    Canceled,
}

/// Drives the scripted conversation off the primary event stream.
pub struct StageMachine<'a> {
    service: &'a dyn AgentService,
    script: &'a Script,
    timeouts: CallTimeouts,
    approver: AutoApprover,
    state: ConversationState,
    cancel_on_exit: bool,
}

impl<'a> StageMachine<'a> {
    pub fn new(service: &'a dyn AgentService, script: &'a Script, timeouts: CallTimeouts) -> Self {
        Self {
            service,
            script,
            timeouts,
            approver: AutoApprover::new(script.task.approval_text.clone()),
            state: ConversationState::new(),
            cancel_on_exit: true,
        }
    }

    /// Skip the teardown cancel when the loop exits.
    pub fn with_cancel_on_exit(mut self, enabled: bool) -> Self {
        self.cancel_on_exit = enabled;
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    /// Consume `events` until the task completes, the stream ends, or the
    /// run is canceled. Always attempts teardown before returning.
    pub async fn run(
        &mut self,
        mut events: EventStream,
        ctx: &mut RunContext,
        cancel: &CancellationToken,
    ) -> Result<LoopExit, HarnessError> {
        let result = loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(LoopExit::Canceled),
                item = events.next() => item,
            };
            let raw = match item {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    tracing::warn!(stage = %self.state.stage, error = %e, "Event stream failed");
                    break Ok(LoopExit::StreamFailed(e.to_string()));
                }
                None => {
                    tracing::info!(stage = %self.state.stage, "Event stream ended");
                    break Ok(LoopExit::StreamEnded);
                }
            };

            let mut event = classify(&raw);
            event.seq = ctx.log.append(event.clone());
            match self.handle_event(&event, ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break Ok(LoopExit::Completed),
                Err(e) => break Err(e),
            }
        };

        self.finish().await;
        result
    }

    /// Apply one classified event. Public so event sequences can be
    /// replayed without a live stream.
    pub async fn handle_event(&mut self, event: &Event, ctx: &mut RunContext) -> Result<Flow, HarnessError> {
        let stage = self.state.stage;
        tracing::debug!(
            seq = event.seq,
            kind = event.kind.name(),
            %stage,
            is_final = event.is_final,
            "Handling event"
        );

        if stage.is_done() {
            return Ok(Flow::Stop);
        }

        match &event.kind {
            EventKind::TurnStarted { task_id, .. } => {
                self.on_turn_started(task_id, ctx).await;
                Ok(Flow::Continue)
            }
            EventKind::ToolInvocation(tool) => {
                tracing::info!(tool = %tool.name, %stage, "Tool invocation reported");
                self.state.turn_complete = true;
                if stage == Stage::AwaitingTaskCompletion {
                    self.record_task_evidence(event, ctx);
                }
                Ok(Flow::Continue)
            }
            EventKind::TurnUpdate(_) if !event.is_final => Ok(Flow::Continue),
            EventKind::TurnUpdate(turn) => self.on_turn(event, turn, ctx).await,
            EventKind::ErrorSignal { message } => {
                tracing::warn!(%stage, error = %message, "Backend reported an error");
                Ok(Flow::Continue)
            }
            EventKind::StatusSnapshot(_)
            | EventKind::ToolResult(_)
            | EventKind::SettingsAck
            | EventKind::ServerRoster(_)
            | EventKind::Unrecognized { .. } => Ok(Flow::Continue),
        }
    }

    async fn on_turn_started(&mut self, task_id: &str, ctx: &mut RunContext) {
        if !self.state.capture_task_id(task_id) {
            tracing::debug!(task_id, "Ignoring repeated task start");
            return;
        }
        tracing::info!(task_id, "Task started");
        ctx.validations.record(checkpoint::TASK_STARTED, true);

        if !self.state.diff_attempted {
            self.state.diff_attempted = true;
            let marker = self.state.checkpoint_marker.unwrap_or(DIFF_PLACEHOLDER_MARKER);
            match with_timeout("CheckpointDiff", self.timeouts.optional_call, self.service.checkpoint_diff(marker)).await {
                Ok(()) => tracing::info!(marker, "Checkpoint diff succeeded"),
                Err(e) => tracing::warn!(marker, error = %e, "Checkpoint diff failed"),
            }
        }
    }

    async fn on_turn(&mut self, event: &Event, turn: &TurnUpdate, ctx: &mut RunContext) -> Result<Flow, HarnessError> {
        if turn.content_tag() == ContentTag::CheckpointCreated {
            let hash = match turn.say_payload() {
                Some(SayPayload::CheckpointCreated(created)) => created.checkpoint_hash.as_str(),
                _ => turn.message.last_checkpoint_hash.as_str(),
            };
            if let Some(marker) = self.state.update_marker(hash, event.timestamp_ms) {
                tracing::debug!(marker, "Checkpoint marker updated");
            }
        }
        if turn.is_completion_result() {
            self.state.turn_complete = true;
        }

        match self.state.stage {
            Stage::AwaitingInitialReply => self.on_initial_reply(event, turn, ctx).await,
            Stage::AwaitingSecondReply => self.on_second_reply(event, turn, ctx).await,
            Stage::AwaitingTaskCompletion => self.on_task_turn(event, turn, ctx).await,
            Stage::Done => Ok(Flow::Stop),
        }
    }

    async fn on_initial_reply(&mut self, event: &Event, turn: &TurnUpdate, ctx: &mut RunContext) -> Result<Flow, HarnessError> {
        let script = self.script;
        let reply = &script.initial_reply;
        match turn.role() {
            Role::Say if !is_status_chatter(event) => {
                if reply.expect.matches(turn.reply_text()) {
                    self.state.reply_seen = true;
                    if ctx.validations.record(checkpoint::INITIAL_ANSWERED, true) {
                        tracing::info!(text = %turn.reply_text(), "Initial reply validated");
                    }
                }
            }
            Role::Say => {}
            Role::Ask => {
                if self.state.turn_complete && !self.state.reply_seen {
                    tracing::warn!("Turn ended in an ask before the initial reply validated");
                }
            }
        }

        if self.state.turn_complete && (self.state.reply_seen || turn.role() == Role::Ask) {
            self.send_follow_up(&reply.follow_up).await?;
        }
        Ok(Flow::Continue)
    }

    async fn on_second_reply(&mut self, event: &Event, turn: &TurnUpdate, ctx: &mut RunContext) -> Result<Flow, HarnessError> {
        let script = self.script;
        let reply = &script.second_reply;
        match turn.role() {
            Role::Say => {
                let text = turn.reply_text();
                let residual = reply.residual.as_ref().is_some_and(|m| m.matches(text));
                if !text.trim().is_empty() && !residual && !is_status_chatter(event) {
                    self.state.reply_seen = true;
                    if reply.expect.matches(text) {
                        if ctx.validations.record(checkpoint::SECOND_ANSWERED, true) {
                            tracing::info!("Second reply validated");
                        }
                    } else {
                        tracing::debug!(text, "Substantive reply without the expected content");
                    }
                }
            }
            Role::Ask => {
                if turn.ask_kind() == Some(ClineAsk::CompletionResult) {
                    self.state.reply_seen = true;
                    if ctx.validations.record(checkpoint::SECOND_ANSWERED, true) {
                        tracing::info!("Second reply validated by completion ask");
                    }
                }
            }
        }

        if self.state.turn_complete && self.state.reply_seen {
            self.send_follow_up(&reply.follow_up).await?;
        }
        Ok(Flow::Continue)
    }

    async fn on_task_turn(&mut self, event: &Event, turn: &TurnUpdate, ctx: &mut RunContext) -> Result<Flow, HarnessError> {
        self.record_task_evidence(event, ctx);

        match turn.role() {
            Role::Say if turn.is_completion_result() => {
                tracing::info!(result = %turn.reply_text(), "Task completed");
                self.state.finish();
                Ok(Flow::Stop)
            }
            Role::Say => Ok(Flow::Continue),
            Role::Ask => {
                let ask = turn.ask_kind().unwrap_or(ClineAsk::Unspecified);
                let Some(response) = self.approver.response_for(ask) else {
                    return Ok(Flow::Continue);
                };
                self.restore_once(ctx).await;
                tracing::info!(%ask, response_type = response.response_type, "Answering ask");
                deliver(
                    "answer ask",
                    self.timeouts.follow_up,
                    self.service.submit_ask_response(response),
                )
                .await?;
                Ok(Flow::Continue)
            }
        }
    }

    fn record_task_evidence(&self, event: &Event, ctx: &mut RunContext) {
        let artifact = &self.script.task.artifact;
        if file_write_observed(event, artifact) && ctx.validations.record(checkpoint::TOOL_WRITE_SEEN, true) {
            tracing::info!(artifact = %artifact, "File write observed");
        }
        if command_exec_observed(event, artifact) && ctx.validations.record(checkpoint::TOOL_EXEC_SEEN, true) {
            tracing::info!(artifact = %artifact, "Command execution observed");
        }
    }

    /// Restore to the last checkpoint once, after a file write was seen.
    async fn restore_once(&mut self, ctx: &RunContext) {
        if self.state.restore_attempted || !ctx.validations.is_set(checkpoint::TOOL_WRITE_SEEN) {
            return;
        }
        let Some(marker) = self.state.checkpoint_marker else {
            return;
        };
        self.state.restore_attempted = true;
        let request = CheckpointRestoreRequest {
            number: marker,
            restore_type: self.script.task.restore_type.clone(),
        };
        let restored = with_timeout(
            "CheckpointRestore",
            self.timeouts.optional_call,
            self.service.checkpoint_restore(request),
        )
        .await;
        match restored {
            Ok(()) => tracing::info!(marker, "Checkpoint restore succeeded"),
            Err(e) => tracing::warn!(marker, error = %e, "Checkpoint restore failed"),
        }
    }

    async fn send_follow_up(&mut self, prompt: &str) -> Result<(), HarnessError> {
        let from = self.state.stage;
        deliver(
            "send follow-up prompt",
            self.timeouts.follow_up,
            self.service.send_user_input(InvokeRequest::text(prompt)),
        )
        .await?;
        let to = self.state.advance();
        tracing::info!(%from, %to, prompts_sent = self.state.prompts_sent, "Follow-up prompt sent");
        Ok(())
    }

    async fn finish(&mut self) {
        if !self.cancel_on_exit {
            return;
        }
        let Some(task_id) = self.state.active_task_id.clone() else {
            return;
        };
        match with_timeout("CancelTask", self.timeouts.teardown_cancel, self.service.cancel_task()).await {
            Ok(()) => tracing::info!(%task_id, "Task canceled"),
            Err(e) => tracing::warn!(%task_id, error = %e, "Task cancel failed"),
        }
    }
}

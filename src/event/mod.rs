//! Normalized events produced from raw streamed messages.

pub mod classify;

pub use classify::classify;

use crate::proto::cline_message::{AskPayload, SayPayload};
use crate::proto::{ClineAsk, ClineMessage, ClineMessageType, ClineSay, McpServer, State, ToolResult, ToolUse};

/// A classified event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Position in the message log; zero until appended.
    pub seq: u64,
    pub kind: EventKind,
    /// False only for partial turn fragments still being streamed.
    pub is_final: bool,
    /// Milliseconds since epoch as stamped by the backend, or zero.
    pub timestamp_ms: i64,
    /// Free text carried alongside the event, if any.
    pub raw_text: String,
}

/// Closed set of event kinds the harness reacts to.
#[derive(Debug, Clone, PartialEq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    StatusSnapshot(Option<Box<State>>),
    TurnStarted { task_id: String, version: String },
    TurnUpdate(TurnUpdate),
    ToolInvocation(ToolUse),
    ToolResult(ToolResult),
    SettingsAck,
    ErrorSignal { message: String },
    ServerRoster(Vec<McpServer>),
    Unrecognized { type_tag: i32 },
}

impl EventKind {
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

/// Where a turn update came from on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TurnOrigin {
    Committed,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Ask,
    Say,
}

/// Coarse content label used by stage rules and predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ContentTag {
    CompletionResult,
    Text,
    Reasoning,
    ToolDetail,
    Command,
    CommandOutput,
    Error,
    CheckpointCreated,
    ApiRequest,
    Followup,
    Mcp,
    Browser,
    Other,
}

/// A conversation turn update.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnUpdate {
    pub origin: TurnOrigin,
    pub message: ClineMessage,
}

impl TurnUpdate {
    pub fn committed(message: ClineMessage) -> Self {
        Self {
            origin: TurnOrigin::Committed,
            message,
        }
    }

    pub fn role(&self) -> Role {
        match ClineMessageType::try_from(self.message.kind) {
            Ok(ClineMessageType::Say) => Role::Say,
            _ => Role::Ask,
        }
    }

    /// The ask kind, if this is an `ask` turn.
    pub fn ask_kind(&self) -> Option<ClineAsk> {
        match self.role() {
            Role::Ask => Some(ClineAsk::try_from(self.message.ask).unwrap_or(ClineAsk::Unspecified)),
            Role::Say => None,
        }
    }

    /// The say kind, if this is a `say` turn.
    pub fn say_kind(&self) -> Option<ClineSay> {
        match self.role() {
            Role::Say => Some(ClineSay::try_from(self.message.say).unwrap_or(ClineSay::Unspecified)),
            Role::Ask => None,
        }
    }

    pub fn ask_payload(&self) -> Option<&AskPayload> {
        self.message.ask_payload.as_ref()
    }

    pub fn say_payload(&self) -> Option<&SayPayload> {
        self.message.say_payload.as_ref()
    }

    pub fn content_tag(&self) -> ContentTag {
        if let Some(kind) = self.ask_kind() {
            return match kind {
                ClineAsk::CompletionResult => ContentTag::CompletionResult,
                ClineAsk::Followup | ClineAsk::PlanModeRespond => ContentTag::Followup,
                ClineAsk::Command => ContentTag::Command,
                ClineAsk::CommandOutput => ContentTag::CommandOutput,
                ClineAsk::Tool => ContentTag::ToolDetail,
                ClineAsk::ApiReqFailed => ContentTag::Error,
                ClineAsk::UseMcpServer => ContentTag::Mcp,
                ClineAsk::BrowserActionLaunch => ContentTag::Browser,
                _ => ContentTag::Other,
            };
        }
        match self.say_kind().unwrap_or(ClineSay::Unspecified) {
            ClineSay::CompletionResult => ContentTag::CompletionResult,
            ClineSay::Text => ContentTag::Text,
            ClineSay::Reasoning => ContentTag::Reasoning,
            ClineSay::Tool => ContentTag::ToolDetail,
            ClineSay::Command => ContentTag::Command,
            ClineSay::CommandOutput => ContentTag::CommandOutput,
            ClineSay::Error | ClineSay::DiffError | ClineSay::IgnoreError => ContentTag::Error,
            ClineSay::CheckpointCreated => ContentTag::CheckpointCreated,
            ClineSay::ApiReqStarted | ClineSay::ApiReqFinished | ClineSay::ApiReqRetried => {
                ContentTag::ApiRequest
            }
            ClineSay::UseMcpServer
            | ClineSay::McpServerRequestStarted
            | ClineSay::McpServerResponse
            | ClineSay::LoadMcpDocumentation => ContentTag::Mcp,
            ClineSay::BrowserActionLaunch | ClineSay::BrowserAction | ClineSay::BrowserActionResult => {
                ContentTag::Browser
            }
            _ => ContentTag::Other,
        }
    }

    /// Tagged as a completion result, or carrying a completion-result payload.
    pub fn is_completion_result(&self) -> bool {
        self.content_tag() == ContentTag::CompletionResult
            || matches!(self.ask_payload(), Some(AskPayload::CompletionResult(_)))
            || matches!(self.say_payload(), Some(SayPayload::CompletionResult(_)))
    }

    /// Best text for answer checks: completion result, then say text, then raw text.
    pub fn reply_text(&self) -> &str {
        let structured = match (self.ask_payload(), self.say_payload()) {
            (Some(AskPayload::CompletionResult(result)), _) => result.result_text.as_str(),
            (_, Some(SayPayload::CompletionResult(result))) => result.result_text.as_str(),
            (_, Some(SayPayload::Text(text))) => text.text.as_str(),
            _ => "",
        };
        if structured.is_empty() {
            &self.message.text
        } else {
            structured
        }
    }
}

impl Event {
    pub fn turn(&self) -> Option<&TurnUpdate> {
        match &self.kind {
            EventKind::TurnUpdate(turn) => Some(turn),
            _ => None,
        }
    }
}

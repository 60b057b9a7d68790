//! Shared test helpers: a scripted agent backend and wire message builders.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use taskdrive::error::HarnessError;
use taskdrive::proto::cline_message::{AskPayload, SayPayload};
use taskdrive::proto::extension_message::Payload;
use taskdrive::proto::*;
use taskdrive::transport::{AgentService, EventStream};

/// One call the harness made against the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UpdateSettings,
    StartTask { text: String, images: usize },
    SendUserInput(String),
    SubmitAskResponse { response_type: i32, text: String },
    CancelTask,
    ResumeLatestTask,
    CheckpointDiff(i64),
    CheckpointRestore { number: i64, restore_type: String },
    AddRemoteMcpServer { name: String, url: String },
    ToggleMcpServer { name: String, disabled: bool },
    UpdateMcpTimeout { name: String, timeout: i32 },
}

/// How follow-up calls acknowledge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AckMode {
    /// One message, then the stream closes.
    #[default]
    Prompt,
    /// The stream opens and never yields or closes.
    Hanging,
    /// One message, then a stream error.
    Failing,
}

/// Scripted backend that records every call.
pub struct MockAgent {
    calls: Mutex<Vec<Call>>,
    settings: Mutex<Option<EventStream>>,
    task: Mutex<Option<EventStream>>,
    resume: Mutex<Option<EventStream>>,
    failing: Mutex<HashSet<&'static str>>,
    roster: Mutex<Vec<McpServer>>,
    roster_frozen: bool,
    ack_mode: AckMode,
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            settings: Mutex::new(None),
            task: Mutex::new(None),
            resume: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            roster: Mutex::new(Vec::new()),
            roster_frozen: false,
            ack_mode: AckMode::Prompt,
        }
    }

    /// Events streamed by `start_task`.
    pub fn with_task_events(self, events: Vec<ExtensionMessage>) -> Self {
        self.with_task_stream(from_events(events))
    }

    pub fn with_task_stream(self, stream: EventStream) -> Self {
        *self.task.lock().unwrap() = Some(stream);
        self
    }

    /// Events streamed by `resume_latest_task`.
    pub fn with_resume_events(self, events: Vec<ExtensionMessage>) -> Self {
        *self.resume.lock().unwrap() = Some(from_events(events));
        self
    }

    /// Replace the default settings acknowledgement.
    pub fn with_settings_stream(self, stream: EventStream) -> Self {
        *self.settings.lock().unwrap() = Some(stream);
        self
    }

    /// Make the named call fail before its stream opens.
    pub fn failing(self, call: &'static str) -> Self {
        self.failing.lock().unwrap().insert(call);
        self
    }

    /// Acknowledgement behaviour for `send_user_input` and `submit_ask_response`.
    pub fn with_ack(mut self, mode: AckMode) -> Self {
        self.ack_mode = mode;
        self
    }

    /// Roster calls succeed but never change the roster.
    pub fn with_frozen_roster(mut self) -> Self {
        self.roster_frozen = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_inputs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendUserInput(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn ask_responses(&self) -> Vec<(i32, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SubmitAskResponse { response_type, text } => Some((response_type, text)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, name: &'static str, call: Call) -> Result<(), HarnessError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(name) {
            return Err(HarnessError::Rpc {
                call: name.to_string(),
                code: tonic::Code::Internal,
                message: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    fn edit_roster(&self, edit: impl FnOnce(&mut Vec<McpServer>)) -> Vec<McpServer> {
        let mut roster = self.roster.lock().unwrap();
        if !self.roster_frozen {
            edit(&mut roster);
        }
        roster.clone()
    }
}

#[async_trait]
impl AgentService for MockAgent {
    async fn update_settings(&self, _request: UpdateSettingsRequest) -> Result<EventStream, HarnessError> {
        self.record("update_settings", Call::UpdateSettings)?;
        Ok(self
            .settings
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| from_events(vec![state_snapshot(), settings_ack()])))
    }

    async fn start_task(&self, request: NewTaskRequest) -> Result<EventStream, HarnessError> {
        self.record(
            "start_task",
            Call::StartTask {
                text: request.text,
                images: request.images.len(),
            },
        )?;
        Ok(self.task.lock().unwrap().take().unwrap_or_else(|| from_events(vec![])))
    }

    async fn send_user_input(&self, request: InvokeRequest) -> Result<EventStream, HarnessError> {
        self.record("send_user_input", Call::SendUserInput(request.text))?;
        Ok(ack(self.ack_mode))
    }

    async fn submit_ask_response(&self, request: AskResponseRequest) -> Result<EventStream, HarnessError> {
        self.record(
            "submit_ask_response",
            Call::SubmitAskResponse {
                response_type: request.response_type,
                text: request.text,
            },
        )?;
        Ok(ack(self.ack_mode))
    }

    async fn cancel_task(&self) -> Result<(), HarnessError> {
        self.record("cancel_task", Call::CancelTask)
    }

    async fn resume_latest_task(&self) -> Result<EventStream, HarnessError> {
        self.record("resume_latest_task", Call::ResumeLatestTask)?;
        Ok(self.resume.lock().unwrap().take().unwrap_or_else(|| from_events(vec![])))
    }

    async fn checkpoint_diff(&self, marker: i64) -> Result<(), HarnessError> {
        self.record("checkpoint_diff", Call::CheckpointDiff(marker))
    }

    async fn checkpoint_restore(&self, request: CheckpointRestoreRequest) -> Result<(), HarnessError> {
        self.record(
            "checkpoint_restore",
            Call::CheckpointRestore {
                number: request.number,
                restore_type: request.restore_type,
            },
        )
    }

    async fn add_remote_mcp_server(
        &self,
        request: AddRemoteMcpServerRequest,
    ) -> Result<Vec<McpServer>, HarnessError> {
        self.record(
            "add_remote_mcp_server",
            Call::AddRemoteMcpServer {
                name: request.server_name.clone(),
                url: request.server_url.clone(),
            },
        )?;
        Ok(self.edit_roster(|roster| {
            roster.push(McpServer {
                name: request.server_name,
                config: serde_json::json!({ "url": request.server_url, "transportType": "sse" }).to_string(),
                ..Default::default()
            })
        }))
    }

    async fn toggle_mcp_server(&self, request: ToggleMcpServerRequest) -> Result<Vec<McpServer>, HarnessError> {
        self.record(
            "toggle_mcp_server",
            Call::ToggleMcpServer {
                name: request.server_name.clone(),
                disabled: request.disabled,
            },
        )?;
        Ok(self.edit_roster(|roster| {
            for server in roster.iter_mut().filter(|s| s.name == request.server_name) {
                server.disabled = request.disabled;
            }
        }))
    }

    async fn update_mcp_timeout(&self, request: UpdateMcpTimeoutRequest) -> Result<Vec<McpServer>, HarnessError> {
        self.record(
            "update_mcp_timeout",
            Call::UpdateMcpTimeout {
                name: request.server_name.clone(),
                timeout: request.timeout,
            },
        )?;
        Ok(self.edit_roster(|roster| {
            for server in roster.iter_mut().filter(|s| s.name == request.server_name) {
                server.timeout = request.timeout;
            }
        }))
    }
}

pub fn from_events(events: Vec<ExtensionMessage>) -> EventStream {
    stream::iter(events.into_iter().map(Ok)).boxed()
}

fn ack(mode: AckMode) -> EventStream {
    match mode {
        AckMode::Prompt => from_events(vec![ExtensionMessage::default()]),
        AckMode::Hanging => stream::pending::<Result<ExtensionMessage, HarnessError>>().boxed(),
        AckMode::Failing => async_stream::stream! {
            yield Ok(ExtensionMessage::default());
            yield Err(HarnessError::Stream("acknowledgement reset".to_string()));
        }
        .boxed(),
    }
}

// --- wire message builders ---

pub fn task_started(task_id: &str) -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::TaskStarted as i32,
        task_started: Some(TaskStarted {
            task_id: task_id.to_string(),
            version: "1".to_string(),
        }),
        ..Default::default()
    }
}

pub fn settings_ack() -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::DidUpdateSettings as i32,
        ..Default::default()
    }
}

pub fn state_snapshot() -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::State as i32,
        payload: Some(Payload::State(State {
            version: "3.0.0".to_string(),
            platform: "linux".to_string(),
            ..Default::default()
        })),
        ..Default::default()
    }
}

pub fn error_signal(message: &str) -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::Error as i32,
        error_message: message.to_string(),
        ..Default::default()
    }
}

pub fn tool_use(name: &str) -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::ToolUse as i32,
        payload: Some(Payload::ToolUse(ToolUse {
            tool_use_id: "tu-1".to_string(),
            name: name.to_string(),
            input: "{}".to_string(),
        })),
        ..Default::default()
    }
}

pub fn committed(message: ClineMessage) -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::NewChatMessage as i32,
        new_chat_message: Some(message),
        ..Default::default()
    }
}

pub fn partial(message: ClineMessage) -> ExtensionMessage {
    ExtensionMessage {
        kind: ExtensionMessageType::PartialMessage as i32,
        partial_message: Some(message),
        ..Default::default()
    }
}

pub fn say(say: ClineSay, text: &str, payload: Option<SayPayload>) -> ClineMessage {
    ClineMessage {
        ts: 1_700_000_000_000,
        kind: ClineMessageType::Say as i32,
        text: text.to_string(),
        say: say as i32,
        say_payload: payload,
        ..Default::default()
    }
}

pub fn ask(ask: ClineAsk, text: &str, payload: Option<AskPayload>) -> ClineMessage {
    ClineMessage {
        ts: 1_700_000_000_000,
        kind: ClineMessageType::Ask as i32,
        text: text.to_string(),
        ask: ask as i32,
        ask_payload: payload,
        ..Default::default()
    }
}

pub fn say_text(text: &str) -> ExtensionMessage {
    committed(say(
        ClineSay::Text,
        text,
        Some(SayPayload::Text(TextContent { text: text.to_string() })),
    ))
}

pub fn say_completion(text: &str) -> ExtensionMessage {
    committed(say(
        ClineSay::CompletionResult,
        text,
        Some(SayPayload::CompletionResult(CompletionResult {
            result_text: text.to_string(),
            has_changes: false,
        })),
    ))
}

pub fn ask_completion(text: &str) -> ExtensionMessage {
    committed(ask(
        ClineAsk::CompletionResult,
        text,
        Some(AskPayload::CompletionResult(CompletionResult {
            result_text: text.to_string(),
            has_changes: false,
        })),
    ))
}

pub fn ask_followup(question: &str) -> ExtensionMessage {
    committed(ask(
        ClineAsk::Followup,
        question,
        Some(AskPayload::Followup(Choice {
            question: question.to_string(),
            ..Default::default()
        })),
    ))
}

pub fn ask_tool(tool: &str, path: &str) -> ExtensionMessage {
    let text = serde_json::json!({ "tool": tool, "path": path }).to_string();
    committed(ask(
        ClineAsk::Tool,
        &text,
        Some(AskPayload::Tool(ToolDetails {
            tool: tool.to_string(),
            path: path.to_string(),
            ..Default::default()
        })),
    ))
}

pub fn ask_command(command: &str) -> ExtensionMessage {
    committed(ask(
        ClineAsk::Command,
        command,
        Some(AskPayload::Command(CommandText {
            command_text: command.to_string(),
        })),
    ))
}

pub fn say_api_request(request: &str) -> ExtensionMessage {
    committed(say(
        ClineSay::ApiReqStarted,
        request,
        Some(SayPayload::ApiReqInfo(ApiReqInfo {
            request: request.to_string(),
            ..Default::default()
        })),
    ))
}

pub fn say_checkpoint(hash: &str) -> ExtensionMessage {
    committed(say(
        ClineSay::CheckpointCreated,
        "",
        Some(SayPayload::CheckpointCreated(CheckpointCreated {
            checkpoint_hash: hash.to_string(),
        })),
    ))
}

/// A streaming text fragment; `still_streaming` marks it non-final.
pub fn partial_text(text: &str, still_streaming: bool) -> ExtensionMessage {
    let mut message = say(
        ClineSay::Text,
        text,
        Some(SayPayload::Text(TextContent { text: text.to_string() })),
    );
    message.partial = still_streaming;
    partial(message)
}

/// A happy-path conversation from task start to completion.
pub fn full_conversation() -> Vec<ExtensionMessage> {
    vec![
        task_started("task-1"),
        say_text("2+2 = 4"),
        say_completion("2+2 = 4"),
        say_text("Donald Trump is an American businessman and politician who served as president."),
        say_completion("Donald Trump is the 45th and 47th president of the United States."),
        say_checkpoint("1700000000500"),
        ask_tool("newFileCreated", "calculator.html"),
        ask_command("open calculator.html"),
        say_completion("Created calculator.html and ran open calculator.html"),
    ]
}

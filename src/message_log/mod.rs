//! Append-only record of every classified event in a run.

use std::fmt::{self, Write};

use chrono::{DateTime, Utc};

use crate::event::{Event, EventKind, TurnUpdate};
use crate::proto::cline_message::{AskPayload, SayPayload};
use crate::proto::{ApiProvider, McpServerStatus, State, ToolDetails};
use crate::util::text::preview_marked;

const REQUEST_PREVIEW_BYTES: usize = 100;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub event: Event,
    pub received_at: DateTime<Utc>,
}

/// Ordered event log, owned by a single run.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number (starting at 1).
    pub fn append(&mut self, mut event: Event) -> u64 {
        let seq = self.entries.len() as u64 + 1;
        event.seq = seq;
        self.entries.push(LogEntry {
            event,
            received_at: Utc::now(),
        });
        seq
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().map(|e| &e.event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable dump of every event, once each, in arrival order.
    pub fn summarize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MessageLog {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.entries.len();
        writeln!(out, "=== Message log: {total} events ===")?;
        for entry in &self.entries {
            let event = &entry.event;
            writeln!(
                out,
                "Message {}/{}: kind={} final={} received={}",
                event.seq,
                total,
                event.kind.name(),
                event.is_final,
                entry.received_at.format("%H:%M:%S%.3f"),
            )?;
            describe(event, out)?;
        }
        writeln!(out, "=== End of message log ===")
    }
}

fn describe(event: &Event, out: &mut impl Write) -> fmt::Result {
    match &event.kind {
        EventKind::StatusSnapshot(Some(state)) => describe_state(state, out),
        EventKind::StatusSnapshot(None) => writeln!(out, "  state: <no payload>"),
        EventKind::TurnStarted { task_id, version } => {
            writeln!(out, "  task_id: {task_id}")?;
            if !version.is_empty() {
                writeln!(out, "  version: {version}")?;
            }
            Ok(())
        }
        EventKind::TurnUpdate(turn) => describe_turn(turn, out),
        EventKind::ToolInvocation(tool) => {
            writeln!(out, "  tool_use_id: {}", tool.tool_use_id)?;
            writeln!(out, "  name: {}", tool.name)?;
            writeln!(out, "  input: {}", preview_marked(&tool.input, REQUEST_PREVIEW_BYTES))
        }
        EventKind::ToolResult(result) => {
            writeln!(out, "  tool_use_id: {}", result.tool_use_id)?;
            writeln!(out, "  is_error: {}", result.is_error)?;
            writeln!(out, "  content: {}", preview_marked(&result.content, REQUEST_PREVIEW_BYTES))
        }
        EventKind::SettingsAck => writeln!(out, "  settings confirmed"),
        EventKind::ErrorSignal { message } => writeln!(out, "  error: {message}"),
        EventKind::ServerRoster(servers) => {
            writeln!(out, "  servers: {}", servers.len())?;
            for server in servers {
                let status = McpServerStatus::try_from(server.status)
                    .unwrap_or(McpServerStatus::Disconnected);
                writeln!(
                    out,
                    "    - {} status={} disabled={} timeout={} tools={}",
                    server.name,
                    status,
                    server.disabled,
                    server.timeout,
                    server.tools.len()
                )?;
            }
            Ok(())
        }
        EventKind::Unrecognized { type_tag } => writeln!(out, "  unrecognized type tag: {type_tag}"),
    }
}

fn describe_state(state: &State, out: &mut impl Write) -> fmt::Result {
    writeln!(out, "  version: {}", state.version)?;
    if let Some(api) = &state.api_configuration {
        writeln!(
            out,
            "  api: provider={} model={} key_set={}",
            ApiProvider::try_from(api.api_provider).unwrap_or(ApiProvider::Unspecified),
            api.api_model_id,
            !api.api_key.is_empty()
        )?;
    }
    if let Some(item) = &state.current_task_item {
        writeln!(out, "  current task: {} ({})", item.id, preview_marked(&item.task, 60))?;
    }
    writeln!(out, "  task history: {}", state.task_history.len())?;
    writeln!(out, "  messages: {}", state.cline_messages.len())?;
    if !state.platform.is_empty() {
        writeln!(out, "  platform: {}", state.platform)?;
    }
    Ok(())
}

fn describe_turn(turn: &TurnUpdate, out: &mut impl Write) -> fmt::Result {
    let message = &turn.message;
    let kind = match (turn.ask_kind(), turn.say_kind()) {
        (Some(ask), _) => format!("ask/{ask}"),
        (_, Some(say)) => format!("say/{say}"),
        _ => "unknown".to_string(),
    };
    writeln!(
        out,
        "  {kind} origin={} ts={} partial={}",
        turn.origin, message.ts, message.partial
    )?;
    if !message.text.is_empty() {
        writeln!(out, "  text: {}", message.text)?;
    }
    if !message.reasoning.is_empty() {
        writeln!(out, "  reasoning: {}", message.reasoning)?;
    }
    if !message.images.is_empty() {
        writeln!(out, "  images: {}", message.images.len())?;
    }
    if !message.last_checkpoint_hash.is_empty() {
        writeln!(out, "  last checkpoint: {}", message.last_checkpoint_hash)?;
    }
    if let Some(payload) = turn.ask_payload() {
        describe_ask(payload, out)?;
    }
    if let Some(payload) = turn.say_payload() {
        describe_say(payload, out)?;
    }
    Ok(())
}

fn describe_tool(details: &ToolDetails, out: &mut impl Write) -> fmt::Result {
    writeln!(out, "    tool: {}", details.tool)?;
    for (label, value) in [
        ("path", &details.path),
        ("diff", &details.diff),
        ("content", &details.content),
        ("regex", &details.regex),
        ("file pattern", &details.file_pattern),
    ] {
        if !value.is_empty() {
            writeln!(out, "    {label}: {}", preview_marked(value, REQUEST_PREVIEW_BYTES))?;
        }
    }
    writeln!(out, "    in workspace: {}", details.operation_is_located_in_workspace)
}

fn describe_ask(payload: &AskPayload, out: &mut impl Write) -> fmt::Result {
    match payload {
        AskPayload::Followup(choice) | AskPayload::PlanModeRespond(choice) => {
            writeln!(out, "    question: {}", choice.question)?;
            if !choice.options.is_empty() {
                writeln!(out, "    options: {}", choice.options.join(" | "))?;
            }
            if !choice.selected.is_empty() {
                writeln!(out, "    selected: {}", choice.selected)?;
            }
            Ok(())
        }
        AskPayload::Command(command) => writeln!(out, "    command: {}", command.command_text),
        AskPayload::CommandOutput(output) => writeln!(out, "    output: {}", output.output_text),
        AskPayload::CompletionResult(result) => writeln!(out, "    result: {}", result.result_text),
        AskPayload::Tool(details) => describe_tool(details, out),
        AskPayload::ApiReqFailed(error) => writeln!(out, "    api request failed: {}", error.error_message),
        AskPayload::ResumeTask(task) => writeln!(out, "    resume task: {}", task.task_id),
        AskPayload::ResumeCompletedTask(task) => {
            writeln!(out, "    resume completed task: {}", task.task_id)
        }
        AskPayload::MistakeLimitReached(_) => writeln!(out, "    mistake limit reached"),
        AskPayload::AutoApprovalMaxReqReached(_) => {
            writeln!(out, "    auto-approval request limit reached")
        }
        AskPayload::BrowserActionLaunch(launch) => writeln!(out, "    browser launch: {}", launch.url),
        AskPayload::UseMcpServer(mcp) => writeln!(
            out,
            "    mcp: server={} type={} tool={} uri={} args={}",
            mcp.server_name, mcp.kind, mcp.tool_name, mcp.uri, mcp.arguments_json
        ),
        AskPayload::NewTask(task) => writeln!(out, "    new task context: {}", task.context),
    }
}

fn describe_say(payload: &SayPayload, out: &mut impl Write) -> fmt::Result {
    match payload {
        SayPayload::Task(task) => writeln!(out, "    task: {}", task.task_description),
        SayPayload::Error(error) => writeln!(out, "    error: {}", error.error_message),
        SayPayload::ApiReqInfo(info) => {
            writeln!(out, "    request: {}", preview_marked(&info.request, REQUEST_PREVIEW_BYTES))?;
            writeln!(
                out,
                "    tokens in={} out={} cache writes={} reads={} cost={:.4}",
                info.tokens_in, info.tokens_out, info.cache_writes, info.cache_reads, info.cost
            )?;
            if !info.cancel_reason.is_empty() {
                writeln!(out, "    cancel reason: {}", info.cancel_reason)?;
            }
            Ok(())
        }
        SayPayload::Text(text) => writeln!(out, "    text: {}", text.text),
        SayPayload::Reasoning(text) => writeln!(out, "    reasoning: {}", text.text),
        SayPayload::CompletionResult(result) => writeln!(
            out,
            "    result: {} (has changes: {})",
            result.result_text, result.has_changes
        ),
        SayPayload::UserFeedback(text) => writeln!(out, "    feedback: {}", text.text),
        SayPayload::UserFeedbackDiff(diff) => {
            writeln!(out, "    feedback diff: {}", preview_marked(&diff.diff, REQUEST_PREVIEW_BYTES))
        }
        SayPayload::Command(command) => writeln!(out, "    command: {}", command.command_text),
        SayPayload::CommandOutput(output) => writeln!(out, "    output: {}", output.output_text),
        SayPayload::Tool(details) => describe_tool(details, out),
        SayPayload::ShellIntegrationWarning(text) => writeln!(out, "    shell warning: {}", text.text),
        SayPayload::BrowserActionLaunch(launch) => writeln!(out, "    browser launch: {}", launch.url),
        SayPayload::BrowserAction(action) => writeln!(
            out,
            "    browser action: {} at {} text={}",
            action.action, action.coordinate, action.text
        ),
        SayPayload::BrowserActionResult(result) => writeln!(
            out,
            "    browser result: url={} mouse={} logs={} screenshot bytes={}",
            result.current_url,
            result.current_mouse_position,
            preview_marked(&result.logs, REQUEST_PREVIEW_BYTES),
            result.screenshot.len()
        ),
        SayPayload::McpServerRequestStarted(server) => {
            writeln!(out, "    mcp request started: {}", server.server_name)
        }
        SayPayload::McpServerResponse(response) => writeln!(
            out,
            "    mcp response from {}: {}",
            response.server_name,
            preview_marked(&response.response_content, REQUEST_PREVIEW_BYTES)
        ),
        SayPayload::UseMcpServer(mcp) => writeln!(
            out,
            "    mcp: server={} type={} tool={} uri={}",
            mcp.server_name, mcp.kind, mcp.tool_name, mcp.uri
        ),
        SayPayload::DiffError(error) => {
            writeln!(out, "    diff error on {}: {}", error.path, error.error_message)
        }
        SayPayload::DeletedApiReqs(deleted) => writeln!(out, "    deleted api requests: {}", deleted.count),
        SayPayload::IgnoreError(error) => writeln!(out, "    ignore-file error: {}", error.error_message),
        SayPayload::CheckpointCreated(checkpoint) => {
            writeln!(out, "    checkpoint: {}", checkpoint.checkpoint_hash)
        }
        SayPayload::LoadMcpDocumentation(_) => writeln!(out, "    loading mcp documentation"),
    }
}

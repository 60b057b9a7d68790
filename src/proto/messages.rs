//! Streamed event messages and turn payloads.

/// Top-level tag carried by every streamed event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ExtensionMessageType {
    Unspecified = 0,
    State = 1,
    TaskStarted = 2,
    PartialMessage = 3,
    NewChatMessage = 4,
    DidUpdateSettings = 5,
    Error = 6,
    McpServers = 7,
    ToolUse = 8,
    ToolResult = 9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ClineMessageType {
    Ask = 0,
    Say = 1,
}

/// What an `ask` turn is requesting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ClineAsk {
    Unspecified = 0,
    Followup = 1,
    PlanModeRespond = 2,
    Command = 3,
    CommandOutput = 4,
    CompletionResult = 5,
    Tool = 6,
    ApiReqFailed = 7,
    ResumeTask = 8,
    ResumeCompletedTask = 9,
    MistakeLimitReached = 10,
    AutoApprovalMaxReqReached = 11,
    BrowserActionLaunch = 12,
    UseMcpServer = 13,
    NewTask = 14,
}

/// What a `say` turn is reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ClineSay {
    Unspecified = 0,
    Task = 1,
    Error = 2,
    ApiReqStarted = 3,
    ApiReqFinished = 4,
    Text = 5,
    Reasoning = 6,
    CompletionResult = 7,
    UserFeedback = 8,
    UserFeedbackDiff = 9,
    ApiReqRetried = 10,
    Command = 11,
    CommandOutput = 12,
    Tool = 13,
    ShellIntegrationWarning = 14,
    BrowserActionLaunch = 15,
    BrowserAction = 16,
    BrowserActionResult = 17,
    McpServerRequestStarted = 18,
    McpServerResponse = 19,
    UseMcpServer = 20,
    DiffError = 21,
    DeletedApiReqs = 22,
    IgnoreError = 23,
    CheckpointCreated = 24,
    LoadMcpDocumentation = 25,
}

/// One event on a streaming response.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExtensionMessage {
    #[prost(enumeration = "ExtensionMessageType", tag = "1")]
    pub kind: i32,
    #[prost(message, optional, tag = "2")]
    pub task_started: Option<TaskStarted>,
    #[prost(message, optional, tag = "3")]
    pub new_chat_message: Option<ClineMessage>,
    #[prost(message, optional, tag = "4")]
    pub partial_message: Option<ClineMessage>,
    #[prost(string, tag = "5")]
    pub error_message: String,
    #[prost(string, tag = "6")]
    pub generic_text: String,
    #[prost(oneof = "extension_message::Payload", tags = "10, 11, 12, 13")]
    pub payload: Option<extension_message::Payload>,
}

pub mod extension_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "10")]
        State(super::State),
        #[prost(message, tag = "11")]
        ToolUse(super::ToolUse),
        #[prost(message, tag = "12")]
        ToolResult(super::ToolResult),
        #[prost(message, tag = "13")]
        McpServers(super::super::McpServers),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskStarted {
    #[prost(string, tag = "1")]
    pub task_id: String,
    #[prost(string, tag = "2")]
    pub version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToolUse {
    #[prost(string, tag = "1")]
    pub tool_use_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    /// JSON-encoded tool input.
    #[prost(string, tag = "3")]
    pub input: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToolResult {
    #[prost(string, tag = "1")]
    pub tool_use_id: String,
    #[prost(bool, tag = "2")]
    pub is_error: bool,
    #[prost(string, tag = "3")]
    pub content: String,
}

/// Backend status snapshot.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct State {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(message, optional, tag = "2")]
    pub api_configuration: Option<super::ApiConfiguration>,
    #[prost(string, tag = "3")]
    pub custom_instructions: String,
    #[prost(string, tag = "4")]
    pub telemetry_setting: String,
    #[prost(message, optional, tag = "5")]
    pub chat_settings: Option<super::ChatSettings>,
    #[prost(message, optional, tag = "6")]
    pub current_task_item: Option<HistoryItem>,
    #[prost(message, repeated, tag = "7")]
    pub task_history: Vec<HistoryItem>,
    #[prost(message, repeated, tag = "8")]
    pub cline_messages: Vec<ClineMessage>,
    #[prost(string, tag = "9")]
    pub platform: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoryItem {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(int64, tag = "2")]
    pub ts: i64,
    #[prost(string, tag = "3")]
    pub task: String,
    #[prost(int64, tag = "4")]
    pub tokens_in: i64,
    #[prost(int64, tag = "5")]
    pub tokens_out: i64,
    #[prost(double, tag = "6")]
    pub total_cost: f64,
}

/// One conversation turn, either an `ask` or a `say`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClineMessage {
    #[prost(int64, tag = "1")]
    pub ts: i64,
    #[prost(enumeration = "ClineMessageType", tag = "2")]
    pub kind: i32,
    #[prost(string, tag = "3")]
    pub text: String,
    #[prost(string, tag = "4")]
    pub reasoning: String,
    #[prost(string, repeated, tag = "5")]
    pub images: Vec<String>,
    #[prost(bool, tag = "6")]
    pub partial: bool,
    #[prost(string, tag = "7")]
    pub last_checkpoint_hash: String,
    #[prost(bool, tag = "8")]
    pub is_checkpoint_checked_out: bool,
    #[prost(int32, tag = "9")]
    pub conversation_history_index: i32,
    #[prost(enumeration = "ClineAsk", tag = "10")]
    pub ask: i32,
    #[prost(enumeration = "ClineSay", tag = "11")]
    pub say: i32,
    #[prost(
        oneof = "cline_message::AskPayload",
        tags = "20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33"
    )]
    pub ask_payload: Option<cline_message::AskPayload>,
    #[prost(
        oneof = "cline_message::SayPayload",
        tags = "40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62"
    )]
    pub say_payload: Option<cline_message::SayPayload>,
}

pub mod cline_message {
    use super::*;

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum AskPayload {
        #[prost(message, tag = "20")]
        Followup(Choice),
        #[prost(message, tag = "21")]
        PlanModeRespond(Choice),
        #[prost(message, tag = "22")]
        Command(CommandText),
        #[prost(message, tag = "23")]
        CommandOutput(CommandOutput),
        #[prost(message, tag = "24")]
        CompletionResult(CompletionResult),
        #[prost(message, tag = "25")]
        Tool(ToolDetails),
        #[prost(message, tag = "26")]
        ApiReqFailed(ErrorText),
        #[prost(message, tag = "27")]
        ResumeTask(TaskRef),
        #[prost(message, tag = "28")]
        ResumeCompletedTask(TaskRef),
        #[prost(message, tag = "29")]
        MistakeLimitReached(Marker),
        #[prost(message, tag = "30")]
        AutoApprovalMaxReqReached(Marker),
        #[prost(message, tag = "31")]
        BrowserActionLaunch(BrowserLaunch),
        #[prost(message, tag = "32")]
        UseMcpServer(McpUse),
        #[prost(message, tag = "33")]
        NewTask(NewTaskContext),
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum SayPayload {
        #[prost(message, tag = "40")]
        Task(TaskText),
        #[prost(message, tag = "41")]
        Error(ErrorText),
        #[prost(message, tag = "42")]
        ApiReqInfo(ApiReqInfo),
        #[prost(message, tag = "43")]
        Text(TextContent),
        #[prost(message, tag = "44")]
        Reasoning(TextContent),
        #[prost(message, tag = "45")]
        CompletionResult(CompletionResult),
        #[prost(message, tag = "46")]
        UserFeedback(TextContent),
        #[prost(message, tag = "47")]
        UserFeedbackDiff(DiffContent),
        #[prost(message, tag = "48")]
        Command(CommandText),
        #[prost(message, tag = "49")]
        CommandOutput(CommandOutput),
        #[prost(message, tag = "50")]
        Tool(ToolDetails),
        #[prost(message, tag = "51")]
        ShellIntegrationWarning(TextContent),
        #[prost(message, tag = "52")]
        BrowserActionLaunch(BrowserLaunch),
        #[prost(message, tag = "53")]
        BrowserAction(BrowserAction),
        #[prost(message, tag = "54")]
        BrowserActionResult(BrowserActionResult),
        #[prost(message, tag = "55")]
        McpServerRequestStarted(McpServerName),
        #[prost(message, tag = "56")]
        McpServerResponse(McpServerResponse),
        #[prost(message, tag = "57")]
        UseMcpServer(McpUse),
        #[prost(message, tag = "58")]
        DiffError(DiffError),
        #[prost(message, tag = "59")]
        DeletedApiReqs(DeletedApiReqs),
        #[prost(message, tag = "60")]
        IgnoreError(ErrorText),
        #[prost(message, tag = "61")]
        CheckpointCreated(CheckpointCreated),
        #[prost(message, tag = "62")]
        LoadMcpDocumentation(Marker),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Choice {
    #[prost(string, tag = "1")]
    pub question: String,
    #[prost(string, repeated, tag = "2")]
    pub options: Vec<String>,
    #[prost(string, tag = "3")]
    pub selected: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandText {
    #[prost(string, tag = "1")]
    pub command_text: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandOutput {
    #[prost(string, tag = "1")]
    pub output_text: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompletionResult {
    #[prost(string, tag = "1")]
    pub result_text: String,
    #[prost(bool, tag = "2")]
    pub has_changes: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToolDetails {
    #[prost(string, tag = "1")]
    pub tool: String,
    #[prost(string, tag = "2")]
    pub path: String,
    #[prost(string, tag = "3")]
    pub diff: String,
    #[prost(string, tag = "4")]
    pub content: String,
    #[prost(string, tag = "5")]
    pub regex: String,
    #[prost(string, tag = "6")]
    pub file_pattern: String,
    #[prost(bool, tag = "7")]
    pub operation_is_located_in_workspace: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorText {
    #[prost(string, tag = "1")]
    pub error_message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskRef {
    #[prost(string, tag = "1")]
    pub task_id: String,
}

/// Payload-less marker turn.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Marker {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowserLaunch {
    #[prost(string, tag = "1")]
    pub url: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpUse {
    #[prost(string, tag = "1")]
    pub server_name: String,
    #[prost(string, tag = "2")]
    pub kind: String,
    #[prost(string, tag = "3")]
    pub tool_name: String,
    #[prost(string, tag = "4")]
    pub arguments_json: String,
    #[prost(string, tag = "5")]
    pub uri: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NewTaskContext {
    #[prost(string, tag = "1")]
    pub context: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskText {
    #[prost(string, tag = "1")]
    pub task_description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApiReqInfo {
    #[prost(string, tag = "1")]
    pub request: String,
    #[prost(int64, tag = "2")]
    pub tokens_in: i64,
    #[prost(int64, tag = "3")]
    pub tokens_out: i64,
    #[prost(int64, tag = "4")]
    pub cache_writes: i64,
    #[prost(int64, tag = "5")]
    pub cache_reads: i64,
    #[prost(double, tag = "6")]
    pub cost: f64,
    #[prost(string, tag = "7")]
    pub cancel_reason: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TextContent {
    #[prost(string, tag = "1")]
    pub text: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DiffContent {
    #[prost(string, tag = "1")]
    pub diff: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowserAction {
    #[prost(string, tag = "1")]
    pub action: String,
    #[prost(string, tag = "2")]
    pub coordinate: String,
    #[prost(string, tag = "3")]
    pub text: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowserActionResult {
    #[prost(string, tag = "1")]
    pub screenshot: String,
    #[prost(string, tag = "2")]
    pub logs: String,
    #[prost(string, tag = "3")]
    pub current_url: String,
    #[prost(string, tag = "4")]
    pub current_mouse_position: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpServerName {
    #[prost(string, tag = "1")]
    pub server_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpServerResponse {
    #[prost(string, tag = "1")]
    pub server_name: String,
    #[prost(string, tag = "2")]
    pub response_content: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DiffError {
    #[prost(string, tag = "1")]
    pub error_message: String,
    #[prost(string, tag = "2")]
    pub path: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeletedApiReqs {
    #[prost(int32, tag = "1")]
    pub count: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckpointCreated {
    #[prost(string, tag = "1")]
    pub checkpoint_hash: String,
}

//! Request messages and the server-roster schema.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum AskResponseType {
    Unspecified = 0,
    YesButtonClicked = 1,
    NoButtonClicked = 2,
    MessageResponse = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ApiProvider {
    Unspecified = 0,
    Anthropic = 1,
    Openai = 2,
    Openrouter = 3,
    Bedrock = 4,
    Ollama = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ChatMode {
    Plan = 0,
    Act = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum McpServerStatus {
    Disconnected = 0,
    Connected = 1,
    Connecting = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApiConfiguration {
    #[prost(enumeration = "ApiProvider", tag = "1")]
    pub api_provider: i32,
    #[prost(string, tag = "2")]
    pub api_model_id: String,
    #[prost(string, tag = "3")]
    pub api_key: String,
    #[prost(string, tag = "4")]
    pub open_ai_api_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChatSettings {
    #[prost(enumeration = "ChatMode", tag = "1")]
    pub mode: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateSettingsRequest {
    #[prost(message, optional, tag = "1")]
    pub api_configuration: Option<ApiConfiguration>,
    #[prost(message, optional, tag = "2")]
    pub chat_settings: Option<ChatSettings>,
}

/// Starts a task from a prompt and optional image data URLs.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NewTaskRequest {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(string, repeated, tag = "2")]
    pub images: Vec<String>,
}

/// Free-form user input for the running task.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvokeRequest {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(string, repeated, tag = "2")]
    pub images: Vec<String>,
}

impl InvokeRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }
}

/// Answer to an `ask` turn.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AskResponseRequest {
    #[prost(enumeration = "AskResponseType", tag = "1")]
    pub response_type: i32,
    #[prost(string, tag = "2")]
    pub text: String,
    #[prost(string, repeated, tag = "3")]
    pub images: Vec<String>,
}

impl AskResponseRequest {
    pub fn new(response_type: AskResponseType, text: impl Into<String>) -> Self {
        Self {
            response_type: response_type as i32,
            text: text.into(),
            images: Vec::new(),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckpointRestoreRequest {
    #[prost(int64, tag = "1")]
    pub number: i64,
    #[prost(string, tag = "2")]
    pub restore_type: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64Request {
    #[prost(int64, tag = "1")]
    pub value: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpTool {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpServer {
    #[prost(string, tag = "1")]
    pub name: String,
    /// JSON-encoded server configuration.
    #[prost(string, tag = "2")]
    pub config: String,
    #[prost(enumeration = "McpServerStatus", tag = "3")]
    pub status: i32,
    #[prost(string, tag = "4")]
    pub error: String,
    #[prost(bool, tag = "5")]
    pub disabled: bool,
    #[prost(int32, tag = "6")]
    pub timeout: i32,
    #[prost(message, repeated, tag = "7")]
    pub tools: Vec<McpTool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpServers {
    #[prost(message, repeated, tag = "1")]
    pub servers: Vec<McpServer>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddRemoteMcpServerRequest {
    #[prost(string, tag = "1")]
    pub server_name: String,
    #[prost(string, tag = "2")]
    pub server_url: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToggleMcpServerRequest {
    #[prost(string, tag = "1")]
    pub server_name: String,
    #[prost(bool, tag = "2")]
    pub disabled: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateMcpTimeoutRequest {
    #[prost(string, tag = "1")]
    pub server_name: String,
    #[prost(int32, tag = "2")]
    pub timeout: i32,
}

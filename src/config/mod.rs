//! Configuration (layered: code > env > `.env` file > defaults).

pub mod script;

pub use script::{ReplyStage, ResumeStage, RosterPlan, Script, TaskStage};

use std::fmt;
use std::time::Duration;

use crate::proto::{ApiConfiguration, ApiProvider, ChatMode, ChatSettings, UpdateSettingsRequest};

pub const DEFAULT_GRPC_HOST: &str = "localhost";
pub const DEFAULT_GRPC_PORT: u16 = 50051;
pub const DEFAULT_CLIENT_ID: &str = "taskdrive-client";
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const PLACEHOLDER_OPENAI_KEY: &str = "sk-placeholder-openai-key";
pub const MAX_MESSAGE_BYTES: usize = 50 * 1024 * 1024;

/// Per-call deadlines. The primary event stream itself has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    /// Wait for the backend to confirm a settings update.
    pub settings_confirm: Duration,
    /// Send a follow-up prompt or approval and drain its acknowledgement.
    pub follow_up: Duration,
    /// Best-effort task cancellation during teardown.
    pub teardown_cancel: Duration,
    /// Demonstration calls such as checkpoint diff/restore and roster edits.
    pub optional_call: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            settings_confirm: Duration::from_secs(10),
            follow_up: Duration::from_secs(15),
            teardown_cancel: Duration::from_secs(15),
            optional_call: Duration::from_secs(10),
        }
    }
}

/// Harness configuration.
#[derive(Clone)]
pub struct HarnessConfig {
    pub grpc_host: String,
    pub grpc_port: u16,
    pub client_id: String,
    pub api_provider: ApiProvider,
    pub api_key: Option<String>,
    pub model_id: String,
    pub openai_api_key: String,
    pub dial_timeout: Duration,
    pub max_message_bytes: usize,
    pub timeouts: CallTimeouts,
    /// Pause before resuming the latest task in the second phase.
    pub resume_delay: Duration,
    pub roster_checks: bool,
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("grpc_host", &self.grpc_host)
            .field("grpc_port", &self.grpc_port)
            .field("client_id", &self.client_id)
            .field("api_provider", &self.api_provider)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("model_id", &self.model_id)
            .field("dial_timeout", &self.dial_timeout)
            .field("timeouts", &self.timeouts)
            .field("roster_checks", &self.roster_checks)
            .finish_non_exhaustive()
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            grpc_host: DEFAULT_GRPC_HOST.to_string(),
            grpc_port: DEFAULT_GRPC_PORT,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            api_provider: ApiProvider::Anthropic,
            api_key: None,
            model_id: DEFAULT_MODEL.to_string(),
            openai_api_key: PLACEHOLDER_OPENAI_KEY.to_string(),
            dial_timeout: Duration::from_secs(30),
            max_message_bytes: MAX_MESSAGE_BYTES,
            timeouts: CallTimeouts::default(),
            resume_delay: Duration::from_secs(5),
            roster_checks: true,
        }
    }
}

impl HarnessConfig {
    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = non_empty("AGENT_GRPC_HOST") {
            config.grpc_host = host;
        }
        if let Some(port) = non_empty("AGENT_GRPC_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) if port > 0 => config.grpc_port = port,
                _ => tracing::warn!(
                    value = %port,
                    default = DEFAULT_GRPC_PORT,
                    "Invalid AGENT_GRPC_PORT, using default"
                ),
            }
        }
        if let Some(client_id) = non_empty("AGENT_CLIENT_ID") {
            config.client_id = client_id;
        }
        config.api_key = non_empty("ANTHROPIC_API_KEY");
        if let Some(model) = non_empty("ANTHROPIC_MODEL") {
            config.model_id = model;
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            config.openai_api_key = key;
        }
        config
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.grpc_port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.grpc_host = host.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: CallTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_resume_delay(mut self, delay: Duration) -> Self {
        self.resume_delay = delay;
        self
    }

    pub fn with_roster_checks(mut self, enabled: bool) -> Self {
        self.roster_checks = enabled;
        self
    }

    pub fn grpc_target(&self) -> String {
        format!("http://{}:{}", self.grpc_host, self.grpc_port)
    }

    /// Settings pushed to the backend before a task starts.
    pub fn settings_request(&self) -> UpdateSettingsRequest {
        if self.api_key.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY is not set; the backend will likely reject requests");
        }
        UpdateSettingsRequest {
            api_configuration: Some(ApiConfiguration {
                api_provider: self.api_provider as i32,
                api_model_id: self.model_id.clone(),
                api_key: self.api_key.clone().unwrap_or_default(),
                open_ai_api_key: self.openai_api_key.clone(),
            }),
            chat_settings: Some(ChatSettings {
                mode: ChatMode::Act as i32,
            }),
        }
    }
}

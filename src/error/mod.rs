//! Error types for taskdrive.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all harness operations.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provisioning failed during {step}: {message}")]
    Provision { step: String, message: String },

    #[error("Backend not ready: {0}")]
    NotReady(String),

    #[error("Connection to {target} failed: {message}")]
    Connection { target: String, message: String },

    #[error("RPC {call} failed ({code}): {message}")]
    Rpc {
        call: String,
        code: tonic::Code,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("{call} timed out after {ms}ms")]
    Timeout { call: String, ms: u64 },

    #[error("Settings update was not confirmed: {0}")]
    SettingsNotConfirmed(String),

    #[error("Could not {step}: {source}")]
    CouldNotAdvance {
        step: String,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Run canceled")]
    Canceled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Script error: {0}")]
    Script(#[from] toml::de::Error),
}

impl HarnessError {
    /// Create a provisioning error for a named step.
    pub fn provision(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provision {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure to deliver the next scripted input.
    pub fn could_not_advance(step: impl Into<String>, source: HarnessError) -> Self {
        Self::CouldNotAdvance {
            step: step.into(),
            source: Box::new(source),
        }
    }

    pub fn timeout(call: impl Into<String>, ms: u64) -> Self {
        Self::Timeout { call: call.into(), ms }
    }

    /// Convert a gRPC status into a harness error for the named call.
    pub fn from_status(call: &str, status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
                Self::Authentication(format!("{call}: {}", status.message()))
            }
            code => Self::Rpc {
                call: call.to_string(),
                code,
                message: status.message().to_string(),
            },
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidArgument(_) | Self::Script(_) => {
                ErrorCategory::Configuration
            }
            Self::Provision { .. }
            | Self::NotReady(_)
            | Self::Connection { .. }
            | Self::SettingsNotConfirmed(_) => ErrorCategory::FatalSetup,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::CouldNotAdvance { .. } => ErrorCategory::ConversationStalled,
            Self::Stream(_) => ErrorCategory::StreamEnd,
            Self::Rpc { code, .. } => match code {
                tonic::Code::Unimplemented => ErrorCategory::NotImplemented,
                tonic::Code::DeadlineExceeded => ErrorCategory::Timeout,
                tonic::Code::Unavailable => ErrorCategory::FatalSetup,
                _ => ErrorCategory::RecoverableProtocol,
            },
            Self::Canceled | Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error ends the run when it reaches the orchestrator.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::FatalSetup
                | ErrorCategory::Authentication
                | ErrorCategory::ConversationStalled
                | ErrorCategory::Configuration
        )
    }

    /// Whether polling the same operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotReady(_) | Self::Connection { .. } | Self::Timeout { .. } => true,
            Self::Rpc { code, .. } => matches!(code, tonic::Code::Unavailable),
            _ => false,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::FatalSetup => RecoverySuggestion::CheckEnvironment,
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::ConversationStalled | ErrorCategory::StreamEnd => {
                RecoverySuggestion::InspectBackendLogs
            }
            _ => RecoverySuggestion::None,
        }
    }
}

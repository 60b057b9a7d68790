//! Error classification shared by the harness and its reports.

use serde::{Deserialize, Serialize};

/// Broad error category used to decide whether a run can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// Provisioning, readiness, dialing, settings or the first scripted call failed.
    FatalSetup,
    /// The backend rejected our credentials.
    Authentication,
    /// A follow-up prompt or approval could not be delivered.
    ConversationStalled,
    /// An optional or demonstration call failed; the run continues.
    RecoverableProtocol,
    /// The backend does not implement the call.
    NotImplemented,
    Timeout,
    /// The primary event stream ended or broke.
    StreamEnd,
    Configuration,
    Unknown,
}

/// Suggested next step printed alongside fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    CheckEnvironment,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    InspectBackendLogs,
    None,
}

impl RecoverySuggestion {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CheckEnvironment => Some("verify the backend container is built and listening"),
            Self::CheckCredentials => Some("check ANTHROPIC_API_KEY and the client id"),
            Self::CheckConfiguration => Some("check AGENT_GRPC_HOST / AGENT_GRPC_PORT and the script file"),
            Self::IncreaseTimeout => Some("the backend may be slow; raise the call timeouts"),
            Self::InspectBackendLogs => Some("inspect the collected backend logs"),
            Self::None => None,
        }
    }
}

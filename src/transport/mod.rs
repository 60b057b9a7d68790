//! RPC boundary to the agent backend.

pub mod grpc;

pub use grpc::{connect, GrpcAgentService};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::HarnessError;
use crate::proto::{
    AddRemoteMcpServerRequest, AskResponseRequest, CheckpointRestoreRequest, ExtensionMessage,
    InvokeRequest, McpServer, NewTaskRequest, ToggleMcpServerRequest, UpdateMcpTimeoutRequest,
    UpdateSettingsRequest,
};

/// A server-streaming response.
pub type EventStream = BoxStream<'static, Result<ExtensionMessage, HarnessError>>;

/// Calls the harness makes against the backend.
///
/// Streaming calls resolve once the call is open; the returned stream then
/// yields events until the backend closes it.
#[async_trait]
pub trait AgentService: Send + Sync {
    async fn update_settings(&self, request: UpdateSettingsRequest) -> Result<EventStream, HarnessError>;

    async fn start_task(&self, request: NewTaskRequest) -> Result<EventStream, HarnessError>;

    async fn send_user_input(&self, request: InvokeRequest) -> Result<EventStream, HarnessError>;

    async fn submit_ask_response(&self, request: AskResponseRequest) -> Result<EventStream, HarnessError>;

    async fn cancel_task(&self) -> Result<(), HarnessError>;

    async fn resume_latest_task(&self) -> Result<EventStream, HarnessError>;

    async fn checkpoint_diff(&self, marker: i64) -> Result<(), HarnessError>;

    async fn checkpoint_restore(&self, request: CheckpointRestoreRequest) -> Result<(), HarnessError>;

    async fn add_remote_mcp_server(
        &self,
        request: AddRemoteMcpServerRequest,
    ) -> Result<Vec<McpServer>, HarnessError>;

    async fn toggle_mcp_server(&self, request: ToggleMcpServerRequest) -> Result<Vec<McpServer>, HarnessError>;

    async fn update_mcp_timeout(&self, request: UpdateMcpTimeoutRequest) -> Result<Vec<McpServer>, HarnessError>;
}

/// Read an acknowledgement stream to its end.
///
/// Errors after the call opened are logged, not returned. Yields the number
/// of messages seen.
pub async fn drain(mut stream: EventStream, call: &str) -> usize {
    let mut seen = 0;
    while let Some(item) = stream.next().await {
        match item {
            Ok(_) => seen += 1,
            Err(e) => {
                tracing::warn!(call, error = %e, "Acknowledgement stream failed");
                break;
            }
        }
    }
    tracing::debug!(call, messages = seen, "Acknowledgement stream drained");
    seen
}

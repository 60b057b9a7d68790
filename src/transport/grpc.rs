//! tonic-backed implementation of [`AgentService`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};

use super::{AgentService, EventStream};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::proto::{
    AddRemoteMcpServerRequest, AskResponseRequest, CheckpointRestoreRequest, ExtensionMessage,
    Int64Request, InvokeRequest, McpServer, McpServers, NewTaskRequest, ToggleMcpServerRequest,
    UpdateMcpTimeoutRequest, UpdateSettingsRequest,
};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

const CLIENT_ID_HEADER: &str = "client-id";
const DIAL_POLL_INTERVAL: Duration = Duration::from_millis(500);

mod path {
    pub const UPDATE_SETTINGS: &str = "/cline.StateService/UpdateSettings";
    pub const START_TASK: &str = "/cline.TaskControlService/StartTask";
    pub const SEND_USER_INPUT: &str = "/cline.TaskControlService/SendUserInput";
    pub const SUBMIT_ASK_RESPONSE: &str = "/cline.TaskControlService/SubmitAskResponse";
    pub const CANCEL_TASK: &str = "/cline.TaskControlService/CancelTask";
    pub const RESUME_LATEST_TASK: &str = "/cline.TaskControlService/ResumeLatestTask";
    pub const CHECKPOINT_DIFF: &str = "/cline.CheckpointsService/CheckpointDiff";
    pub const CHECKPOINT_RESTORE: &str = "/cline.CheckpointsService/CheckpointRestore";
    pub const ADD_REMOTE_MCP_SERVER: &str = "/cline.McpService/AddRemoteMcpServer";
    pub const TOGGLE_MCP_SERVER: &str = "/cline.McpService/ToggleMcpServer";
    pub const UPDATE_MCP_TIMEOUT: &str = "/cline.McpService/UpdateMcpTimeout";
}

/// Dial the backend, retrying until the dial timeout elapses.
pub async fn connect(config: &HarnessConfig) -> Result<Channel, HarnessError> {
    let target = config.grpc_target();
    let endpoint = Endpoint::from_shared(target.clone())
        .map_err(|e| HarnessError::Configuration(format!("invalid target {target}: {e}")))?
        .connect_timeout(config.dial_timeout);

    tracing::info!(endpoint = %target, timeout_ms = config.dial_timeout.as_millis() as u64, "Dialing backend");

    let policy = RetryPolicy::fixed(DIAL_POLL_INTERVAL, config.dial_timeout);
    let channel = with_timeout(
        "dial",
        config.dial_timeout,
        policy.execute("dial", || {
            let endpoint = endpoint.clone();
            let target = target.clone();
            async move {
                endpoint.connect().await.map_err(|e| HarnessError::Connection {
                    target,
                    message: e.to_string(),
                })
            }
        }),
    )
    .await
    .map_err(|e| match e {
        HarnessError::Timeout { ms, .. } => HarnessError::Connection {
            target: target.clone(),
            message: format!("no connection within {ms}ms"),
        },
        other => other,
    })?;

    tracing::info!(endpoint = %target, "Dial succeeded");
    Ok(channel)
}

/// [`AgentService`] over a tonic channel.
#[derive(Debug, Clone)]
pub struct GrpcAgentService {
    inner: Grpc<Channel>,
    client_id: MetadataValue<Ascii>,
}

impl GrpcAgentService {
    pub fn new(channel: Channel, config: &HarnessConfig) -> Result<Self, HarnessError> {
        let client_id = config
            .client_id
            .parse::<MetadataValue<Ascii>>()
            .map_err(|e| HarnessError::Configuration(format!("invalid client id: {e}")))?;
        let inner = Grpc::new(channel)
            .max_decoding_message_size(config.max_message_bytes)
            .max_encoding_message_size(config.max_message_bytes);
        Ok(Self { inner, client_id })
    }

    /// Dial and wrap in one step.
    pub async fn connect(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let channel = connect(config).await?;
        Self::new(channel, config)
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request
            .metadata_mut()
            .insert(CLIENT_ID_HEADER, self.client_id.clone());
        request
    }

    async fn ready(&self, call: &str) -> Result<Grpc<Channel>, HarnessError> {
        let mut grpc = self.inner.clone();
        grpc.ready().await.map_err(|e| HarnessError::Rpc {
            call: call.to_string(),
            code: tonic::Code::Unavailable,
            message: format!("service was not ready: {e}"),
        })?;
        Ok(grpc)
    }

    async fn unary<Req, Resp>(&self, route: &'static str, message: Req) -> Result<Resp, HarnessError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.ready(route).await?;
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(self.request(message), PathAndQuery::from_static(route), codec)
            .await
            .map_err(|status| HarnessError::from_status(route, status))?;
        Ok(response.into_inner())
    }

    async fn server_streaming<Req>(&self, route: &'static str, message: Req) -> Result<EventStream, HarnessError>
    where
        Req: prost::Message + Send + Sync + 'static,
    {
        let mut grpc = self.ready(route).await?;
        let codec: ProstCodec<Req, ExtensionMessage> = ProstCodec::default();
        let response = grpc
            .server_streaming(self.request(message), PathAndQuery::from_static(route), codec)
            .await
            .map_err(|status| HarnessError::from_status(route, status))?;
        let stream = response
            .into_inner()
            .map(move |item| item.map_err(|status| HarnessError::from_status(route, status)));
        Ok(stream.boxed())
    }
}

#[async_trait]
impl AgentService for GrpcAgentService {
    async fn update_settings(&self, request: UpdateSettingsRequest) -> Result<EventStream, HarnessError> {
        self.server_streaming(path::UPDATE_SETTINGS, request).await
    }

    async fn start_task(&self, request: NewTaskRequest) -> Result<EventStream, HarnessError> {
        self.server_streaming(path::START_TASK, request).await
    }

    async fn send_user_input(&self, request: InvokeRequest) -> Result<EventStream, HarnessError> {
        self.server_streaming(path::SEND_USER_INPUT, request).await
    }

    async fn submit_ask_response(&self, request: AskResponseRequest) -> Result<EventStream, HarnessError> {
        self.server_streaming(path::SUBMIT_ASK_RESPONSE, request).await
    }

    async fn cancel_task(&self) -> Result<(), HarnessError> {
        self.unary::<(), ()>(path::CANCEL_TASK, ()).await
    }

    async fn resume_latest_task(&self) -> Result<EventStream, HarnessError> {
        self.server_streaming(path::RESUME_LATEST_TASK, ()).await
    }

    async fn checkpoint_diff(&self, marker: i64) -> Result<(), HarnessError> {
        self.unary::<_, ()>(path::CHECKPOINT_DIFF, Int64Request { value: marker })
            .await
    }

    async fn checkpoint_restore(&self, request: CheckpointRestoreRequest) -> Result<(), HarnessError> {
        self.unary::<_, ()>(path::CHECKPOINT_RESTORE, request).await
    }

    async fn add_remote_mcp_server(
        &self,
        request: AddRemoteMcpServerRequest,
    ) -> Result<Vec<McpServer>, HarnessError> {
        let roster: McpServers = self.unary(path::ADD_REMOTE_MCP_SERVER, request).await?;
        Ok(roster.servers)
    }

    async fn toggle_mcp_server(&self, request: ToggleMcpServerRequest) -> Result<Vec<McpServer>, HarnessError> {
        let roster: McpServers = self.unary(path::TOGGLE_MCP_SERVER, request).await?;
        Ok(roster.servers)
    }

    async fn update_mcp_timeout(&self, request: UpdateMcpTimeoutRequest) -> Result<Vec<McpServer>, HarnessError> {
        let roster: McpServers = self.unary(path::UPDATE_MCP_TIMEOUT, request).await?;
        Ok(roster.servers)
    }
}

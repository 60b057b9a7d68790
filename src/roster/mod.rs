//! Remote tool-server roster checks run before the conversation.
//!
//! Every step is best effort: a failed call or an unexpected roster is
//! logged and leaves its checkpoint unset.

use std::time::Duration;

use crate::config::RosterPlan;
use crate::conversation::RunContext;
use crate::error::HarnessError;
use crate::proto::{AddRemoteMcpServerRequest, McpServer, ToggleMcpServerRequest, UpdateMcpTimeoutRequest};
use crate::transport::AgentService;
use crate::util::timeout::with_timeout;
use crate::validation::checkpoint;

pub struct RosterCheck<'a> {
    service: &'a dyn AgentService,
    plan: &'a RosterPlan,
    timeout: Duration,
}

impl<'a> RosterCheck<'a> {
    pub fn new(service: &'a dyn AgentService, plan: &'a RosterPlan, timeout: Duration) -> Self {
        Self { service, plan, timeout }
    }

    /// Run every step, recording checkpoints into `ctx`.
    pub async fn run(&self, ctx: &mut RunContext) {
        let plan = self.plan;

        let added = self
            .step(
                "add remote server",
                self.service.add_remote_mcp_server(AddRemoteMcpServerRequest {
                    server_name: plan.server_name.clone(),
                    server_url: plan.server_url.clone(),
                }),
                |servers| {
                    find(servers, &plan.server_name).is_some_and(|s| configured_url(s).as_deref() == Some(plan.server_url.as_str()))
                },
            )
            .await;
        ctx.validations.record(checkpoint::ROSTER_ADD, added);

        let disabled = self
            .step(
                "disable server",
                self.service.toggle_mcp_server(ToggleMcpServerRequest {
                    server_name: plan.server_name.clone(),
                    disabled: true,
                }),
                |servers| find(servers, &plan.server_name).is_some_and(|s| s.disabled),
            )
            .await;
        ctx.validations.record(checkpoint::ROSTER_DISABLE, disabled);

        if disabled {
            let enabled = self
                .step(
                    "enable server",
                    self.service.toggle_mcp_server(ToggleMcpServerRequest {
                        server_name: plan.server_name.clone(),
                        disabled: false,
                    }),
                    |servers| find(servers, &plan.server_name).is_some_and(|s| !s.disabled),
                )
                .await;
            ctx.validations.record(checkpoint::ROSTER_ENABLE, enabled);
        } else {
            tracing::warn!(server = %plan.server_name, "Skipping enable step, disable was not confirmed");
        }

        let timeout_set = self
            .step(
                "update server timeout",
                self.service.update_mcp_timeout(UpdateMcpTimeoutRequest {
                    server_name: plan.server_name.clone(),
                    timeout: plan.timeout_secs,
                }),
                |servers| find(servers, &plan.server_name).is_some_and(|s| s.timeout == plan.timeout_secs),
            )
            .await;
        ctx.validations.record(checkpoint::ROSTER_TIMEOUT, timeout_set);

        let sse_added = self
            .step(
                "add second remote server",
                self.service.add_remote_mcp_server(AddRemoteMcpServerRequest {
                    server_name: plan.sse_server_name.clone(),
                    server_url: plan.sse_server_url.clone(),
                }),
                |servers| find(servers, &plan.sse_server_name).is_some(),
            )
            .await;
        ctx.validations.record(checkpoint::ROSTER_ADD_SSE, sse_added);
    }

    async fn step<F>(&self, step: &str, call: F, verify: impl Fn(&[McpServer]) -> bool) -> bool
    where
        F: std::future::Future<Output = Result<Vec<McpServer>, HarnessError>>,
    {
        match with_timeout(step, self.timeout, call).await {
            Ok(servers) => {
                let ok = verify(&servers);
                if ok {
                    tracing::info!(step, servers = servers.len(), "Roster step verified");
                } else {
                    tracing::warn!(step, servers = servers.len(), "Roster did not reflect the change");
                }
                ok
            }
            Err(e) => {
                tracing::warn!(step, error = %e, "Roster call failed");
                false
            }
        }
    }
}

fn find<'s>(servers: &'s [McpServer], name: &str) -> Option<&'s McpServer> {
    servers.iter().find(|s| s.name == name)
}

/// The `url` field of a server's JSON config.
pub fn configured_url(server: &McpServer) -> Option<String> {
    let config: serde_json::Value = serde_json::from_str(&server.config).ok()?;
    config.get("url")?.as_str().map(str::to_string)
}

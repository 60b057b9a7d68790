//! Bringing up (and tearing down) the backend under test.

pub mod docker;

pub use docker::{DockerProvisioner, DEFAULT_EXTENSION_ID};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::HarnessError;

/// Lifecycle of the environment hosting the agent backend.
#[async_trait]
pub trait EnvironmentProvisioner: Send + Sync {
    /// Build and start the environment.
    async fn provision(&mut self) -> Result<(), HarnessError>;

    /// Wait until the backend accepts connections, or fail with `NotReady`.
    async fn wait_ready(&self, budget: Duration) -> Result<(), HarnessError>;

    /// Stop and remove whatever `provision` created. Safe to call twice.
    async fn teardown(&mut self) -> Result<(), HarnessError>;

    /// Backend logs, if the environment keeps any.
    async fn fetch_logs(&self) -> Result<Option<String>, HarnessError>;
}

/// A backend that is already running; nothing to provision.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalEnvironment;

#[async_trait]
impl EnvironmentProvisioner for ExternalEnvironment {
    async fn provision(&mut self) -> Result<(), HarnessError> {
        tracing::debug!("Using an externally managed backend");
        Ok(())
    }

    async fn wait_ready(&self, _budget: Duration) -> Result<(), HarnessError> {
        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), HarnessError> {
        Ok(())
    }

    async fn fetch_logs(&self) -> Result<Option<String>, HarnessError> {
        Ok(None)
    }
}

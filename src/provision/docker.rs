//! Docker-hosted backend: build an image around the extension package, run
//! it with the gRPC port published, and poll the port from inside.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;

use super::EnvironmentProvisioner;
use crate::error::HarnessError;
use crate::util::retry::RetryPolicy;
use crate::util::text::preview;

pub const DEFAULT_EXTENSION_ID: &str = "rooveterinaryinc.cline";

const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(600);
const ERROR_PREVIEW_BYTES: usize = 2048;

const DEFAULT_DOCKERFILE: &str = r#"FROM mcr.microsoft.com/vscode/devcontainers/base:ubuntu

RUN curl -fsSL https://code-server.dev/install.sh | sh

RUN apt-get update && apt-get install -y \
    netcat \
    && rm -rf /var/lib/apt/lists/*

COPY extension.vsix /tmp/extension.vsix
RUN code-server --install-extension /tmp/extension.vsix

WORKDIR /workspace

CMD ["code-server", "--bind-addr", "0.0.0.0:8080", "--auth", "none", "/workspace"]
"#;

#[derive(Debug, Clone)]
pub struct DockerProvisioner {
    extension_path: PathBuf,
    workspace: PathBuf,
    extension_id: String,
    grpc_port: u16,
    container_id: Option<String>,
}

impl DockerProvisioner {
    pub fn new(extension_path: impl Into<PathBuf>, workspace: impl Into<PathBuf>, grpc_port: u16) -> Self {
        Self {
            extension_path: extension_path.into(),
            workspace: workspace.into(),
            extension_id: DEFAULT_EXTENSION_ID.to_string(),
            grpc_port,
            container_id: None,
        }
    }

    pub fn with_extension_id(mut self, id: impl Into<String>) -> Self {
        self.extension_id = id.into();
        self
    }

    pub fn image_tag(&self) -> String {
        format!("{}-test", self.extension_id)
    }

    pub fn container_name(&self) -> String {
        format!("{}-test-container", self.extension_id)
    }

    pub fn dockerfile_path(&self) -> PathBuf {
        self.workspace.join("Dockerfile")
    }

    /// Write the default Dockerfile unless the workspace already has one.
    pub fn ensure_dockerfile(&self) -> Result<bool, HarnessError> {
        let path = self.dockerfile_path();
        if path.exists() {
            return Ok(false);
        }
        std::fs::create_dir_all(&self.workspace)?;
        std::fs::write(&path, DEFAULT_DOCKERFILE)?;
        tracing::info!(path = %path.display(), "Wrote default Dockerfile");
        Ok(true)
    }

    pub fn build_args(&self) -> Vec<String> {
        vec![
            "build".to_string(),
            "-t".to_string(),
            self.image_tag(),
            "-f".to_string(),
            self.dockerfile_path().display().to_string(),
            self.workspace.display().to_string(),
        ]
    }

    pub fn run_args(&self, extension_path: &Path) -> Vec<String> {
        let port = self.grpc_port;
        vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.container_name(),
            "-p".to_string(),
            format!("{port}:{port}"),
            "-v".to_string(),
            format!("{}:/extension.vsix:ro", extension_path.display()),
            "-e".to_string(),
            format!("GRPC_PORT={port}"),
            "-e".to_string(),
            format!("EXTENSION_ID={}", self.extension_id),
            self.image_tag(),
        ]
    }

    pub fn probe_args(&self, container: &str) -> Vec<String> {
        vec![
            "exec".to_string(),
            container.to_string(),
            "nc".to_string(),
            "-z".to_string(),
            "localhost".to_string(),
            self.grpc_port.to_string(),
        ]
    }

    async fn docker(&self, step: &str, args: &[String]) -> Result<Output, HarnessError> {
        tracing::debug!(step, args = ?args, "Running docker");
        let result = tokio::time::timeout(
            COMMAND_TIMEOUT,
            tokio::process::Command::new("docker")
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await;
        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(HarnessError::provision(step, e.to_string())),
            Err(_) => Err(HarnessError::provision(
                step,
                format!("timed out after {}s", COMMAND_TIMEOUT.as_secs()),
            )),
        }
    }

    /// Run a docker step that must exit zero, returning its trimmed stdout.
    async fn docker_ok(&self, step: &str, args: &[String]) -> Result<String, HarnessError> {
        let output = self.docker(step, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::provision(
                step,
                format!(
                    "exit code {:?}: {}",
                    output.status.code(),
                    preview(stderr.trim(), ERROR_PREVIEW_BYTES)
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn absolute_extension_path(&self) -> Result<PathBuf, HarnessError> {
        if self.extension_path.is_absolute() {
            return Ok(self.extension_path.clone());
        }
        Ok(std::env::current_dir()?.join(&self.extension_path))
    }
}

#[async_trait]
impl EnvironmentProvisioner for DockerProvisioner {
    async fn provision(&mut self) -> Result<(), HarnessError> {
        let extension = self.absolute_extension_path()?;
        if !extension.is_file() {
            return Err(HarnessError::provision(
                "locate extension",
                format!("{} is not a file", extension.display()),
            ));
        }
        self.ensure_dockerfile()?;

        tracing::info!(image = %self.image_tag(), "Building image");
        self.docker_ok("build image", &self.build_args()).await?;

        tracing::info!(container = %self.container_name(), port = self.grpc_port, "Starting container");
        let id = self.docker_ok("start container", &self.run_args(&extension)).await?;
        if id.is_empty() {
            return Err(HarnessError::provision("start container", "docker did not report a container id"));
        }
        tracing::info!(container_id = %id, "Container started");
        self.container_id = Some(id);
        Ok(())
    }

    async fn wait_ready(&self, budget: Duration) -> Result<(), HarnessError> {
        let Some(container) = self.container_id.as_deref() else {
            return Err(HarnessError::NotReady("no container running".to_string()));
        };
        let probe = self.probe_args(container);
        let args = probe.as_slice();
        let policy = RetryPolicy::fixed(READY_POLL_INTERVAL, budget);
        let port = self.grpc_port;

        policy
            .execute("readiness probe", move || async move {
                let output = self.docker("probe port", args).await?;
                if output.status.success() {
                    Ok(())
                } else {
                    Err(HarnessError::NotReady(format!("port {port} not open in {container}")))
                }
            })
            .await?;
        tracing::info!(container, port, "Backend is ready");
        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), HarnessError> {
        let Some(id) = self.container_id.clone() else {
            return Ok(());
        };
        self.docker_ok("stop container", &["stop".to_string(), id.clone()]).await?;
        self.docker_ok("remove container", &["rm".to_string(), id.clone()]).await?;
        tracing::info!(container_id = %id, "Container removed");
        self.container_id = None;
        Ok(())
    }

    async fn fetch_logs(&self) -> Result<Option<String>, HarnessError> {
        let Some(id) = self.container_id.as_deref() else {
            return Ok(None);
        };
        let output = self.docker("fetch logs", &["logs".to_string(), id.to_string()]).await?;
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(Some(logs))
    }
}

//! Command-line surface of the `taskdrive` binary.

pub mod run;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{HarnessConfig, Script};
use crate::error::HarnessError;
use crate::harness::Phase;
use crate::provision::DEFAULT_EXTENSION_ID;

/// Drive a scripted conversation against a gRPC agent backend.
#[derive(Parser, Debug)]
#[command(name = "taskdrive", version, about = "Scripted end-to-end runs against a gRPC agent backend")]
pub struct Cli {
    /// Run the scripted test. Without it the client connects and idles.
    #[arg(long)]
    pub test: bool,

    /// Which scripted run to perform.
    #[arg(long, value_enum, default_value_t = Phase::Conversation)]
    pub phase: Phase,

    /// TOML file overriding the built-in script.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Build and start the backend in Docker before running.
    #[arg(long, requires = "extension")]
    pub provision: bool,

    /// Extension package mounted into the container.
    #[arg(long)]
    pub extension: Option<PathBuf>,

    /// Directory holding the Dockerfile.
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    #[arg(long, default_value = DEFAULT_EXTENSION_ID)]
    pub extension_id: String,

    /// Override AGENT_GRPC_HOST.
    #[arg(long)]
    pub host: Option<String>,

    /// Override AGENT_GRPC_PORT.
    #[arg(long)]
    pub port: Option<u16>,

    /// Skip the remote server roster checks.
    #[arg(long)]
    pub skip_roster: bool,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter; `RUST_LOG` takes precedence.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "taskdrive=debug"
        } else {
            "taskdrive=info"
        }
    }

    /// Environment configuration with command-line overrides applied.
    pub fn harness_config(&self) -> HarnessConfig {
        self.apply(HarnessConfig::from_env())
    }

    fn apply(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(host) = &self.host {
            config = config.with_host(host.clone());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if self.skip_roster {
            config = config.with_roster_checks(false);
        }
        config
    }

    pub fn load_script(&self) -> Result<Script, HarnessError> {
        match &self.script {
            Some(path) => Script::load(path),
            None => Ok(Script::default()),
        }
    }
}

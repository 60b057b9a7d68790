//! Handlers behind the `taskdrive` flags.

use tokio_util::sync::CancellationToken;

use super::Cli;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::harness::{Harness, RunReport};
use crate::provision::{DockerProvisioner, ExternalEnvironment};
use crate::transport::GrpcAgentService;

/// Run whatever the flags ask for and return the process exit code.
pub async fn handle(cli: &Cli) -> Result<i32, HarnessError> {
    let config = cli.harness_config();
    tracing::debug!(?config, "Resolved configuration");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            on_interrupt.cancel();
        }
    });

    if !cli.test {
        idle(&config, &cancel).await?;
        return Ok(0);
    }

    let script = cli.load_script()?;
    let report = match (&cli.extension, cli.provision) {
        (Some(extension), true) => {
            let provisioner = DockerProvisioner::new(extension, &cli.workspace, config.grpc_port)
                .with_extension_id(&cli.extension_id);
            Harness::new(provisioner, config, script).run(cli.phase, &cancel).await
        }
        _ => Harness::new(ExternalEnvironment, config, script).run(cli.phase, &cancel).await,
    };

    print_report(&report, cli.debug);
    Ok(report.exit_code())
}

/// Connect and hold the connection until interrupted.
async fn idle(config: &HarnessConfig, cancel: &CancellationToken) -> Result<(), HarnessError> {
    let _service = GrpcAgentService::connect(config).await?;
    tracing::info!(endpoint = %config.grpc_target(), "Connected; idling until Ctrl-C");
    cancel.cancelled().await;
    tracing::info!("Shutting down");
    Ok(())
}

fn print_report(report: &RunReport, debug: bool) {
    println!("{}", report.log.summarize());
    if let Some(logs) = &report.backend_logs {
        if debug || !report.success() {
            println!("=== Backend logs ===\n{logs}\n=== End of backend logs ===");
        }
    }
    println!("{}", report.render_summary());
}

//! End-to-end runs: provision, connect, drive one phase, collect, tear down.

pub mod report;

pub use report::RunReport;

use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::{HarnessConfig, Script};
use crate::conversation::{LoopExit, ResumeCheck, RunContext, StageMachine};
use crate::error::HarnessError;
use crate::event::{classify, Event, EventKind};
use crate::proto::{NewTaskRequest, UpdateSettingsRequest};
use crate::provision::EnvironmentProvisioner;
use crate::roster::RosterCheck;
use crate::transport::{AgentService, GrpcAgentService};
use crate::util::race::{first_of, RaceOutcome};
use crate::util::timeout::with_timeout;
use crate::validation::checkpoint;

/// How long a provisioned backend gets to open its port.
pub const READY_BUDGET: Duration = Duration::from_secs(30);

/// Which scripted run to perform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Phase {
    /// Multi-step conversation ending in a tool-driven task.
    #[default]
    #[strum(serialize = "phase1")]
    #[cfg_attr(feature = "cli", value(name = "phase1"))]
    Conversation,
    /// Resume the most recent task and check it kept its context.
    #[strum(serialize = "phase2")]
    #[cfg_attr(feature = "cli", value(name = "phase2"))]
    Resume,
}

impl Phase {
    pub fn required_checkpoints(self, roster_checks: bool) -> Vec<String> {
        let names: Vec<&str> = match self {
            Self::Conversation if roster_checks => {
                checkpoint::CONVERSATION.iter().chain(checkpoint::ROSTER).copied().collect()
            }
            Self::Conversation => checkpoint::CONVERSATION.to_vec(),
            Self::Resume => checkpoint::RESUME.to_vec(),
        };
        names.into_iter().map(str::to_string).collect()
    }
}

/// Push settings and wait for the backend to acknowledge them.
///
/// The settings stream is read on its own task, which signals the first
/// acknowledgement and then keeps draining. The wait is raced against
/// `timeout` and `cancel`. Yields the events seen up to the acknowledgement.
pub async fn confirm_settings(
    service: &dyn AgentService,
    request: UpdateSettingsRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Event>, HarnessError> {
    let mut stream = with_timeout("UpdateSettings", timeout, service.update_settings(request))
        .await
        .map_err(settings_failure)?;

    let (tx, rx) = oneshot::channel::<Result<Vec<Event>, HarnessError>>();
    tokio::spawn(async move {
        let mut tx = Some(tx);
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(raw) => {
                    let Some(pending) = tx.take() else { continue };
                    let event = classify(&raw);
                    let confirmed = matches!(event.kind, EventKind::SettingsAck);
                    seen.push(event);
                    if confirmed {
                        let _ = pending.send(Ok(std::mem::take(&mut seen)));
                    } else {
                        tx = Some(pending);
                    }
                }
                Err(e) => {
                    if let Some(pending) = tx.take() {
                        let _ = pending.send(Err(e));
                    }
                    return;
                }
            }
        }
        if let Some(pending) = tx {
            let _ = pending.send(Err(HarnessError::SettingsNotConfirmed(
                "settings stream closed before confirmation".to_string(),
            )));
        }
    });

    match first_of(rx, timeout, cancel).await {
        RaceOutcome::Signal(Ok(Ok(seen))) => {
            tracing::info!(events = seen.len(), "Settings update confirmed");
            Ok(seen)
        }
        RaceOutcome::Signal(Ok(Err(e))) => Err(settings_failure(e)),
        RaceOutcome::Signal(Err(_)) => Err(HarnessError::SettingsNotConfirmed(
            "settings reader stopped without an answer".to_string(),
        )),
        RaceOutcome::TimedOut => Err(HarnessError::SettingsNotConfirmed(format!(
            "no confirmation within {}ms",
            timeout.as_millis()
        ))),
        RaceOutcome::Canceled => Err(HarnessError::Canceled),
    }
}

fn settings_failure(error: HarnessError) -> HarnessError {
    match error {
        e @ (HarnessError::Authentication(_) | HarnessError::SettingsNotConfirmed(_)) => e,
        e => HarnessError::SettingsNotConfirmed(e.to_string()),
    }
}

/// Drive one phase against an already connected backend.
pub async fn run_phase(
    service: &dyn AgentService,
    config: &HarnessConfig,
    script: &Script,
    phase: Phase,
    cancel: &CancellationToken,
) -> RunReport {
    let mut report = RunReport::new(phase, phase.required_checkpoints(config.roster_checks));
    let mut ctx = RunContext::new(report.required.iter().cloned());
    tracing::info!(run_id = %report.run_id, %phase, "Starting run");

    let outcome = match phase {
        Phase::Conversation => run_conversation(service, config, script, &mut ctx, &mut report, cancel).await,
        Phase::Resume => {
            let mut check = ResumeCheck::new(service, &script.resume, config.timeouts).with_delay(config.resume_delay);
            let outcome = check.run(&mut ctx, cancel).await;
            report.task_id = check.resumed_task().map(str::to_string);
            outcome
        }
    };

    match outcome {
        Ok(exit) => report.exit = Some(exit),
        Err(e) => {
            tracing::error!(%phase, error = %e, category = %e.category(), "Run ended with an error");
            report.error = Some(e);
        }
    }
    report.validations = ctx.validations.snapshot();
    report.log = ctx.log;
    report.finished_at = Some(Utc::now());
    tracing::info!(
        run_id = %report.run_id,
        success = report.success(),
        missing = ?report.missing(),
        "Run finished"
    );
    report
}

async fn run_conversation(
    service: &dyn AgentService,
    config: &HarnessConfig,
    script: &Script,
    ctx: &mut RunContext,
    report: &mut RunReport,
    cancel: &CancellationToken,
) -> Result<LoopExit, HarnessError> {
    let settings = confirm_settings(service, config.settings_request(), config.timeouts.settings_confirm, cancel).await?;
    for event in settings {
        ctx.log.append(event);
    }

    if config.roster_checks {
        RosterCheck::new(service, &script.roster, config.timeouts.optional_call)
            .run(ctx)
            .await;
    }
    if cancel.is_cancelled() {
        return Ok(LoopExit::Canceled);
    }

    let request = NewTaskRequest {
        text: script.initial_prompt.clone(),
        images: script.attachments.clone(),
    };
    let events = with_timeout("StartTask", config.timeouts.follow_up, service.start_task(request))
        .await
        .map_err(|e| HarnessError::could_not_advance("start the task", e))?;
    tracing::info!(prompt = %script.initial_prompt, "Task requested");

    let mut machine = StageMachine::new(service, script, config.timeouts);
    let outcome = machine.run(events, ctx, cancel).await;
    report.final_stage = Some(machine.stage());
    report.task_id = machine.state().active_task_id.clone();
    outcome
}

/// A full run including the backend's environment.
pub struct Harness<P> {
    provisioner: P,
    config: HarnessConfig,
    script: Script,
}

impl<P: EnvironmentProvisioner> Harness<P> {
    pub fn new(provisioner: P, config: HarnessConfig, script: Script) -> Self {
        Self {
            provisioner,
            config,
            script,
        }
    }

    /// Provision, connect, run `phase`, then collect logs and tear down.
    /// Teardown runs whenever provisioning started.
    pub async fn run(&mut self, phase: Phase, cancel: &CancellationToken) -> RunReport {
        let mut report = match self.provisioner.provision().await {
            Ok(()) => self.connect_and_run(phase, cancel).await,
            Err(e) => {
                tracing::error!(error = %e, "Provisioning failed");
                self.failed_report(phase, e)
            }
        };

        match self.provisioner.fetch_logs().await {
            Ok(logs) => report.backend_logs = logs,
            Err(e) => tracing::warn!(error = %e, "Could not collect backend logs"),
        }
        if let Err(e) = self.provisioner.teardown().await {
            tracing::warn!(error = %e, "Teardown failed");
        }
        report
    }

    async fn connect_and_run(&self, phase: Phase, cancel: &CancellationToken) -> RunReport {
        if let Err(e) = self.provisioner.wait_ready(READY_BUDGET).await {
            return self.failed_report(phase, e);
        }
        let service = match GrpcAgentService::connect(&self.config).await {
            Ok(service) => service,
            Err(e) => return self.failed_report(phase, e),
        };
        tracing::info!(endpoint = %self.config.grpc_target(), "Connected to backend");
        run_phase(&service, &self.config, &self.script, phase, cancel).await
    }

    fn failed_report(&self, phase: Phase, error: HarnessError) -> RunReport {
        RunReport::new(phase, phase.required_checkpoints(self.config.roster_checks)).fail(error)
    }
}

//! Tests for settings confirmation, roster checks, resume and whole-phase runs.

mod common;

use std::time::Duration;

use futures::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::*;
use taskdrive::config::{HarnessConfig, RosterPlan, Script};
use taskdrive::conversation::{LoopExit, ResumeCheck, RunContext};
use taskdrive::error::{ErrorCategory, HarnessError};
use taskdrive::event::EventKind;
use taskdrive::harness::{confirm_settings, run_phase, Harness, Phase};
use taskdrive::provision::ExternalEnvironment;
use taskdrive::roster::RosterCheck;
use taskdrive::validation::checkpoint;

fn test_config() -> HarnessConfig {
    HarnessConfig::default()
        .with_api_key("sk-test")
        .with_resume_delay(Duration::ZERO)
}

#[tokio::test]
async fn settings_confirmed_by_ack() {
    let agent = MockAgent::new();
    let seen = confirm_settings(
        &agent,
        test_config().settings_request(),
        Duration::from_secs(10),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(seen.len(), 2);
    assert!(matches!(seen[0].kind, EventKind::StatusSnapshot(Some(_))));
    assert!(matches!(seen[1].kind, EventKind::SettingsAck));
}

#[tokio::test(start_paused = true)]
async fn settings_time_out_without_ack() {
    let agent = MockAgent::new().with_settings_stream(stream::pending().boxed());
    let err = confirm_settings(
        &agent,
        test_config().settings_request(),
        Duration::from_secs(10),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, HarnessError::SettingsNotConfirmed(ref m) if m.contains("10000ms")), "got {err:?}");
    assert_eq!(err.category(), ErrorCategory::FatalSetup);
}

#[tokio::test]
async fn settings_stream_closing_early_is_not_confirmation() {
    let agent = MockAgent::new().with_settings_stream(from_events(vec![state_snapshot()]));
    let err = confirm_settings(
        &agent,
        test_config().settings_request(),
        Duration::from_secs(10),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, HarnessError::SettingsNotConfirmed(_)), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn cancellation_wins_settings_race() {
    let agent = MockAgent::new().with_settings_stream(stream::pending().boxed());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = confirm_settings(&agent, test_config().settings_request(), Duration::from_secs(10), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Canceled), "got {err:?}");
}

#[tokio::test]
async fn settings_rejected_credentials_stay_authentication_errors() {
    let agent = MockAgent::new().with_settings_stream(
        stream::iter(vec![Err(HarnessError::Authentication("invalid x-api-key".to_string()))]).boxed(),
    );
    let err = confirm_settings(
        &agent,
        test_config().settings_request(),
        Duration::from_secs(10),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Authentication);
}

#[tokio::test]
async fn roster_steps_all_verify() {
    let agent = MockAgent::new();
    let plan = RosterPlan::default();
    let mut ctx = RunContext::new(checkpoint::ROSTER.iter().copied());

    RosterCheck::new(&agent, &plan, Duration::from_secs(10)).run(&mut ctx).await;

    assert!(ctx.validations.overall_success(checkpoint::ROSTER));
    assert_eq!(
        agent.calls(),
        vec![
            Call::AddRemoteMcpServer {
                name: plan.server_name.clone(),
                url: plan.server_url.clone(),
            },
            Call::ToggleMcpServer {
                name: plan.server_name.clone(),
                disabled: true,
            },
            Call::ToggleMcpServer {
                name: plan.server_name.clone(),
                disabled: false,
            },
            Call::UpdateMcpTimeout {
                name: plan.server_name.clone(),
                timeout: 25,
            },
            Call::AddRemoteMcpServer {
                name: plan.sse_server_name.clone(),
                url: plan.sse_server_url.clone(),
            },
        ]
    );
}

#[tokio::test]
async fn roster_skips_enable_when_disable_unverified() {
    let agent = MockAgent::new().with_frozen_roster();
    let plan = RosterPlan::default();
    let mut ctx = RunContext::new(checkpoint::ROSTER.iter().copied());

    RosterCheck::new(&agent, &plan, Duration::from_secs(10)).run(&mut ctx).await;

    assert_eq!(ctx.validations.missing(checkpoint::ROSTER), checkpoint::ROSTER.to_vec());
    let toggles = agent.count(|c| matches!(c, Call::ToggleMcpServer { .. }));
    assert_eq!(toggles, 1);
}

#[tokio::test]
async fn roster_call_failures_are_not_fatal() {
    let agent = MockAgent::new().failing("toggle_mcp_server");
    let plan = RosterPlan::default();
    let mut ctx = RunContext::new(checkpoint::ROSTER.iter().copied());

    RosterCheck::new(&agent, &plan, Duration::from_secs(10)).run(&mut ctx).await;

    assert!(ctx.validations.is_set(checkpoint::ROSTER_ADD));
    assert!(!ctx.validations.is_set(checkpoint::ROSTER_DISABLE));
    assert!(!ctx.validations.is_set(checkpoint::ROSTER_ENABLE));
    assert!(ctx.validations.is_set(checkpoint::ROSTER_TIMEOUT));
    assert!(ctx.validations.is_set(checkpoint::ROSTER_ADD_SSE));
}

#[tokio::test]
async fn resume_sends_follow_up_and_checks_coherence() {
    let script = Script::default();
    let agent = MockAgent::new().with_resume_events(vec![
        task_started("task-9"),
        say_text(&script.resume.follow_up),
        say_text("The joke was about numbers: why was six afraid of seven?"),
        say_text("not reached"),
    ]);
    let mut ctx = RunContext::new(checkpoint::RESUME.iter().copied());

    let mut check = ResumeCheck::new(&agent, &script.resume, test_config().timeouts);
    let exit = check.run(&mut ctx, &CancellationToken::new()).await.unwrap();

    assert_eq!(exit, LoopExit::Completed);
    assert_eq!(check.resumed_task(), Some("task-9"));
    assert!(ctx.validations.overall_success(checkpoint::RESUME));
    assert_eq!(agent.sent_inputs(), vec![script.resume.follow_up.clone()]);
    assert_eq!(ctx.log.len(), 3);
}

#[tokio::test]
async fn resume_without_task_start_sends_nothing() {
    let script = Script::default();
    let agent = MockAgent::new().with_resume_events(vec![say_text("The joke was about numbers")]);
    let mut ctx = RunContext::new(checkpoint::RESUME.iter().copied());

    let exit = ResumeCheck::new(&agent, &script.resume, test_config().timeouts)
        .run(&mut ctx, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(exit, LoopExit::StreamEnded);
    assert!(agent.sent_inputs().is_empty());
    assert!(!ctx.validations.is_set(checkpoint::RESUME_COHERENT));
}

#[tokio::test]
async fn resume_open_failure_cannot_advance() {
    let script = Script::default();
    let agent = MockAgent::new().failing("resume_latest_task");
    let mut ctx = RunContext::new(checkpoint::RESUME.iter().copied());

    let err = ResumeCheck::new(&agent, &script.resume, test_config().timeouts)
        .run(&mut ctx, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::ConversationStalled);
}

#[tokio::test]
async fn phase_one_passes_against_scripted_backend() {
    let agent = MockAgent::new().with_task_events(full_conversation());
    let script = Script::default();

    let report = run_phase(
        &agent,
        &test_config(),
        &script,
        Phase::Conversation,
        &CancellationToken::new(),
    )
    .await;

    assert!(report.success(), "{}", report.render_summary());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.exit, Some(LoopExit::Completed));
    assert_eq!(report.task_id.as_deref(), Some("task-1"));
    assert!(report.error.is_none());

    let calls = agent.calls();
    assert_eq!(calls[0], Call::UpdateSettings);
    assert!(calls.contains(&Call::StartTask {
        text: "whats 2+2".to_string(),
        images: 1,
    }));
    assert_eq!(calls.last(), Some(&Call::CancelTask));
    // Settings events plus every task event.
    assert_eq!(report.log.len(), 2 + full_conversation().len());
}

#[tokio::test]
async fn phase_one_without_roster_checks_does_not_require_them() {
    let agent = MockAgent::new().with_task_events(full_conversation());
    let config = test_config().with_roster_checks(false);

    let report = run_phase(
        &agent,
        &config,
        &Script::default(),
        Phase::Conversation,
        &CancellationToken::new(),
    )
    .await;

    assert!(report.success(), "{}", report.render_summary());
    assert!(!report.validations.contains_key(checkpoint::ROSTER_ADD));
    assert_eq!(agent.count(|c| matches!(c, Call::AddRemoteMcpServer { .. })), 0);
}

#[tokio::test]
async fn phase_one_fails_when_a_checkpoint_is_missing() {
    let mut events = full_conversation();
    events.retain(|m| {
        !matches!(
            m.new_chat_message.as_ref().map(|c| c.ask),
            Some(a) if a == taskdrive::proto::ClineAsk::Command as i32
        )
    });
    let last = events.len() - 1;
    events[last] = say_completion("Created the calculator.");
    let agent = MockAgent::new().with_task_events(events);

    let report = run_phase(
        &agent,
        &test_config(),
        &Script::default(),
        Phase::Conversation,
        &CancellationToken::new(),
    )
    .await;

    assert!(!report.success());
    assert_eq!(report.missing(), vec![checkpoint::TOOL_EXEC_SEEN]);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn phase_one_start_failure_is_reported() {
    let agent = MockAgent::new().failing("start_task");

    let report = run_phase(
        &agent,
        &test_config(),
        &Script::default(),
        Phase::Conversation,
        &CancellationToken::new(),
    )
    .await;

    let err = report.error.as_ref().unwrap();
    assert_eq!(err.category(), ErrorCategory::ConversationStalled);
    assert!(!report.success());
    assert!(report.render_summary().contains("result: FAILED"));
}

#[tokio::test]
async fn phase_two_runs_only_the_resume_check() {
    let script = Script::default();
    let agent = MockAgent::new().with_resume_events(vec![
        task_started("task-9"),
        say_completion("It was a joke about numbers in the calculator app."),
    ]);

    let report = run_phase(&agent, &test_config(), &script, Phase::Resume, &CancellationToken::new()).await;

    assert!(report.success(), "{}", report.render_summary());
    assert_eq!(
        agent.calls(),
        vec![
            Call::ResumeLatestTask,
            Call::SendUserInput(script.resume.follow_up.clone()),
        ]
    );
}

#[tokio::test]
async fn external_environment_unreachable_backend_fails_setup() {
    let mut config = test_config().with_host("127.0.0.1").with_port(1);
    config.dial_timeout = Duration::from_millis(200);

    let mut harness = Harness::new(ExternalEnvironment, config, Script::default());
    let report = harness.run(Phase::Conversation, &CancellationToken::new()).await;

    let err = report.error.as_ref().unwrap();
    assert_eq!(err.category(), ErrorCategory::FatalSetup, "got {err:?}");
    assert_eq!(report.exit_code(), 1);
    assert!(report.backend_logs.is_none());
}

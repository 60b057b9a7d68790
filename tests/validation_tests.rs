//! Tests for event predicates and checkpoint aggregation.

mod common;

use common::*;
use taskdrive::event::{classify, Event};
use taskdrive::proto::cline_message::SayPayload;
use taskdrive::proto::*;
use taskdrive::validation::predicates::{command_exec_observed, file_write_observed, is_status_chatter};
use taskdrive::validation::{checkpoint, TextMatcher, ValidationSet};

const ARTIFACT: &str = "calculator.html";

fn event(raw: ExtensionMessage) -> Event {
    classify(&raw)
}

#[test]
fn file_write_from_tool_ask() {
    assert!(file_write_observed(&event(ask_tool("newFileCreated", ARTIFACT)), ARTIFACT));
    assert!(file_write_observed(&event(ask_tool("editedExistingFile", ARTIFACT)), ARTIFACT));
    assert!(!file_write_observed(&event(ask_tool("readFile", ARTIFACT)), ARTIFACT));
}

#[test]
fn file_write_from_embedded_json_without_payload() {
    let text = r#"{"tool":"newFileCreated","path":"calculator.html"}"#;
    let raw = committed(ask(ClineAsk::Tool, text, None));
    assert!(file_write_observed(&event(raw), ARTIFACT));
}

#[test]
fn file_write_from_request_accounting() {
    let request = "[write_to_file for 'calculator.html'] Result: The content was successfully saved to calculator.html.";
    assert!(file_write_observed(&event(say_api_request(request)), ARTIFACT));

    let attempted_only = "[write_to_file for 'calculator.html'] Result: error";
    assert!(!file_write_observed(&event(say_api_request(attempted_only)), ARTIFACT));
}

#[test]
fn plain_reply_is_not_a_write() {
    assert!(!file_write_observed(&event(say_text("I wrote calculator.html")), ARTIFACT));
    assert!(!file_write_observed(&event(settings_ack()), ARTIFACT));
}

#[test]
fn command_exec_sources() {
    assert!(command_exec_observed(&event(tool_use("execute_command")), ARTIFACT));
    assert!(!command_exec_observed(&event(tool_use("read_file")), ARTIFACT));
    assert!(command_exec_observed(&event(ask_command("open calculator.html")), ARTIFACT));
    assert!(command_exec_observed(
        &event(say_completion("Created calculator.html and ran open calculator.html")),
        ARTIFACT
    ));
    assert!(!command_exec_observed(&event(say_completion("Created calculator.html")), ARTIFACT));

    let said = committed(say(
        ClineSay::Command,
        "",
        Some(SayPayload::Command(CommandText {
            command_text: "xdg-open calculator.html".to_string(),
        })),
    ));
    assert!(command_exec_observed(&event(said), ARTIFACT));
}

#[test]
fn status_chatter_detection() {
    assert!(is_status_chatter(&event(say_api_request("anything"))));
    assert!(is_status_chatter(&event(say_checkpoint("123"))));
    assert!(!is_status_chatter(&event(say_text("2+2 = 4"))));
    assert!(!is_status_chatter(&event(ask_followup("continue?"))));
    assert!(!is_status_chatter(&event(task_started("t"))));
}

#[test]
fn matcher_applies_to_reply_text() {
    let matcher = TextMatcher::default().require_all(["4"]).require_any(["2+2", "="]);
    let reply = event(say_completion("2+2 = 4"));
    assert!(matcher.matches(reply.turn().unwrap().reply_text()));

    let echo = event(say_text("whats 2+2"));
    assert!(!matcher.matches(echo.turn().unwrap().reply_text()));
}

#[test]
fn conversation_checkpoints_aggregate() {
    let mut set = ValidationSet::new(checkpoint::CONVERSATION.iter().copied());
    for name in &checkpoint::CONVERSATION[..4] {
        set.record(name, true);
    }
    assert!(!set.overall_success(checkpoint::CONVERSATION));
    assert_eq!(set.missing(checkpoint::CONVERSATION), vec![checkpoint::TOOL_EXEC_SEEN]);

    set.record(checkpoint::TOOL_EXEC_SEEN, true);
    set.record(checkpoint::TOOL_WRITE_SEEN, false);
    assert!(set.overall_success(checkpoint::CONVERSATION));
}

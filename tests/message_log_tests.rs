//! Tests for the message log and its diagnostic summary.

mod common;

use common::*;
use taskdrive::event::classify;
use taskdrive::message_log::MessageLog;

fn log_of(messages: Vec<taskdrive::proto::ExtensionMessage>) -> MessageLog {
    let mut log = MessageLog::new();
    for raw in messages {
        log.append(classify(&raw));
    }
    log
}

#[test]
fn every_event_appears_once_in_order() {
    let messages = full_conversation();
    let total = messages.len();
    let log = log_of(messages);
    let summary = log.summarize();

    assert!(summary.starts_with(&format!("=== Message log: {total} events ===")));
    assert!(summary.trim_end().ends_with("=== End of message log ==="));

    let mut last = 0;
    for seq in 1..=total {
        let header = format!("Message {seq}/{total}:");
        assert_eq!(summary.matches(&header).count(), 1, "{header} in\n{summary}");
        let at = summary.find(&header).unwrap();
        assert!(at >= last, "{header} out of order");
        last = at;
    }
}

#[test]
fn sequence_numbers_follow_arrival() {
    let log = log_of(vec![task_started("t-1"), say_text("a"), say_text("b")]);
    let seqs: Vec<u64> = log.events().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(log.events().last().map(|e| e.raw_text.as_str()), Some("b"));
    for pair in log.entries().windows(2) {
        assert!(pair[0].received_at <= pair[1].received_at);
    }
}

#[test]
fn summary_dumps_turn_details() {
    let log = log_of(vec![
        task_started("task-42"),
        ask_tool("newFileCreated", "calculator.html"),
        ask_command("open calculator.html"),
        say_checkpoint("abc123"),
        say_api_request("write_to_file for 'calculator.html'"),
        state_snapshot(),
        error_signal("boom"),
    ]);
    let summary = log.summarize();

    assert!(summary.contains("task_id: task-42"), "{summary}");
    assert!(summary.contains("tool: newFileCreated"), "{summary}");
    assert!(summary.contains("path: calculator.html"), "{summary}");
    assert!(summary.contains("open calculator.html"), "{summary}");
    assert!(summary.contains("abc123"), "{summary}");
    assert!(summary.contains("platform: linux"), "{summary}");
    assert!(summary.contains("error: boom"), "{summary}");
    assert!(summary.contains("kind=status_snapshot"), "{summary}");
}

#[test]
fn long_request_text_is_truncated() {
    let request = "é".repeat(10_000);
    let log = log_of(vec![say_api_request(&request)]);
    let summary = log.summarize();
    let line = summary
        .lines()
        .find(|l| l.trim_start().starts_with("request:"))
        .expect("request line");
    assert!(line.ends_with("..."), "{line}");
    assert!(line.len() < 200);
}

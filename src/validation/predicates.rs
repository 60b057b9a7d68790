//! Pure predicates over single events.

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKind, Role};
use crate::proto::cline_message::{AskPayload, SayPayload};
use crate::proto::{ClineAsk, ClineSay};

/// Tool names the backend reports when it writes a file.
const FILE_WRITE_TOOLS: &[&str] = &["newFileCreated", "editedExistingFile"];
const EXECUTE_COMMAND: &str = "execute_command";

/// Substring checks over reply text, loadable from a script file.
///
/// `all` must all appear; none of `none`/`none_ci` may appear. `any`,
/// `any_ci` and `more_words_than` form one alternative group: when any of
/// them is set, at least one must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextMatcher {
    pub non_empty: bool,
    pub all: Vec<String>,
    pub any: Vec<String>,
    pub any_ci: Vec<String>,
    pub more_words_than: Option<usize>,
    pub none: Vec<String>,
    pub none_ci: Vec<String>,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl TextMatcher {
    pub fn require_non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    pub fn require_all<I: IntoIterator<Item = S>, S: Into<String>>(mut self, items: I) -> Self {
        self.all.extend(owned(items));
        self
    }

    pub fn require_any<I: IntoIterator<Item = S>, S: Into<String>>(mut self, items: I) -> Self {
        self.any.extend(owned(items));
        self
    }

    pub fn require_any_ci<I: IntoIterator<Item = S>, S: Into<String>>(mut self, items: I) -> Self {
        self.any_ci.extend(owned(items));
        self
    }

    pub fn or_more_words_than(mut self, words: usize) -> Self {
        self.more_words_than = Some(words);
        self
    }

    pub fn forbid<I: IntoIterator<Item = S>, S: Into<String>>(mut self, items: I) -> Self {
        self.none.extend(owned(items));
        self
    }

    pub fn forbid_ci<I: IntoIterator<Item = S>, S: Into<String>>(mut self, items: I) -> Self {
        self.none_ci.extend(owned(items));
        self
    }

    /// True when no constraint is configured.
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.non_empty && text.trim().is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        if !self.all.iter().all(|s| text.contains(s.as_str())) {
            return false;
        }
        if self.none.iter().any(|s| text.contains(s.as_str())) {
            return false;
        }
        if self.none_ci.iter().any(|s| lower.contains(&s.to_lowercase())) {
            return false;
        }

        let has_alternatives =
            !self.any.is_empty() || !self.any_ci.is_empty() || self.more_words_than.is_some();
        if !has_alternatives {
            return true;
        }
        self.any.iter().any(|s| text.contains(s.as_str()))
            || self.any_ci.iter().any(|s| lower.contains(&s.to_lowercase()))
            || self
                .more_words_than
                .is_some_and(|n| text.split_whitespace().count() > n)
    }
}

/// Tool name of the first JSON object embedded in `text`, if any.
pub fn embedded_tool_name(text: &str) -> Option<String> {
    let end = text.find('}')?;
    let value: serde_json::Value = serde_json::from_str(&text[..=end]).ok()?;
    value.get("tool")?.as_str().map(str::to_string)
}

fn ask_tool_name(event: &Event) -> Option<String> {
    let turn = event.turn()?;
    if turn.role() != Role::Ask {
        return None;
    }
    match turn.ask_payload() {
        Some(AskPayload::Tool(details)) if !details.tool.is_empty() => Some(details.tool.clone()),
        _ => embedded_tool_name(&turn.message.text),
    }
}

/// Evidence that the agent wrote `artifact` to disk.
pub fn file_write_observed(event: &Event, artifact: &str) -> bool {
    if let Some(tool) = ask_tool_name(event) {
        return FILE_WRITE_TOOLS.contains(&tool.as_str());
    }
    let Some(turn) = event.turn() else {
        return false;
    };
    if turn.say_kind() != Some(ClineSay::ApiReqStarted) {
        return false;
    }
    let request = match turn.say_payload() {
        Some(SayPayload::ApiReqInfo(info)) => info.request.as_str(),
        _ => return false,
    };
    request.contains(&format!("write_to_file for '{artifact}'"))
        && request.contains(&format!("successfully saved to {artifact}"))
}

/// Evidence that the agent tried to run a command on `artifact`.
pub fn command_exec_observed(event: &Event, artifact: &str) -> bool {
    if let EventKind::ToolInvocation(tool) = &event.kind {
        return tool.name == EXECUTE_COMMAND;
    }
    let Some(turn) = event.turn() else {
        return false;
    };
    match turn.role() {
        Role::Ask => {
            turn.ask_kind() == Some(ClineAsk::Command)
                || ask_tool_name(event).as_deref() == Some(EXECUTE_COMMAND)
        }
        Role::Say => match turn.say_payload() {
            Some(SayPayload::Command(command)) => command.command_text.contains(artifact),
            Some(SayPayload::CompletionResult(result)) => {
                result.result_text.contains(&format!("open {artifact}"))
            }
            _ => false,
        },
    }
}

/// Status or accounting chatter that never counts as a reply.
pub fn is_status_chatter(event: &Event) -> bool {
    matches!(
        event.turn().and_then(|t| t.say_kind()),
        Some(ClineSay::ApiReqStarted | ClineSay::ApiReqFinished | ClineSay::CheckpointCreated)
    )
}

//! Conversation stage and per-run progress.

/// Scripted conversation stages, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    #[default]
    AwaitingInitialReply,
    AwaitingSecondReply,
    AwaitingTaskCompletion,
    Done,
}

impl Stage {
    /// The following stage. `Done` stays `Done`.
    pub fn next(self) -> Self {
        match self {
            Self::AwaitingInitialReply => Self::AwaitingSecondReply,
            Self::AwaitingSecondReply => Self::AwaitingTaskCompletion,
            Self::AwaitingTaskCompletion | Self::Done => Self::Done,
        }
    }

    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

/// Mutable progress of one conversation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub stage: Stage,
    /// Follow-up prompts delivered so far.
    pub prompts_sent: u32,
    /// The agent finished its current turn.
    pub turn_complete: bool,
    /// A substantive reply arrived during the current stage.
    pub reply_seen: bool,
    /// First non-empty task id reported by the backend.
    pub active_task_id: Option<String>,
    pub checkpoint_marker: Option<i64>,
    pub diff_attempted: bool,
    pub restore_attempted: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the task id unless one is already known.
    pub fn capture_task_id(&mut self, task_id: &str) -> bool {
        if self.active_task_id.is_some() || task_id.is_empty() {
            return false;
        }
        self.active_task_id = Some(task_id.to_string());
        true
    }

    /// Record a follow-up prompt and move to the next stage.
    pub fn advance(&mut self) -> Stage {
        self.prompts_sent += 1;
        self.turn_complete = false;
        self.reply_seen = false;
        self.stage = self.stage.next();
        self.stage
    }

    pub fn finish(&mut self) {
        self.stage = Stage::Done;
    }

    /// Update the checkpoint marker from a checkpoint hash, falling back to
    /// the event timestamp when the hash is not a non-zero integer.
    pub fn update_marker(&mut self, checkpoint_hash: &str, timestamp_ms: i64) -> Option<i64> {
        let marker = checkpoint_hash
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|v| *v != 0)
            .or((timestamp_ms != 0).then_some(timestamp_ms));
        if marker.is_some() {
            self.checkpoint_marker = marker;
        }
        marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_only_move_forward() {
        let mut stage = Stage::default();
        let mut seen = vec![stage];
        for _ in 0..5 {
            let next = stage.next();
            assert!(next >= stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen[3], Stage::Done);
        assert_eq!(seen[5], Stage::Done);
    }

    #[test]
    fn advance_resets_turn_flags() {
        let mut state = ConversationState::new();
        state.turn_complete = true;
        state.reply_seen = true;
        assert_eq!(state.advance(), Stage::AwaitingSecondReply);
        assert_eq!(state.prompts_sent, 1);
        assert!(!state.turn_complete);
        assert!(!state.reply_seen);
    }

    #[test]
    fn task_id_is_captured_once() {
        let mut state = ConversationState::new();
        assert!(!state.capture_task_id(""));
        assert!(state.capture_task_id("t-1"));
        assert!(!state.capture_task_id("t-2"));
        assert_eq!(state.active_task_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn marker_prefers_numeric_hash() {
        let mut state = ConversationState::new();
        assert_eq!(state.update_marker("1700000000123", 5), Some(1_700_000_000_123));
    }

    #[test]
    fn marker_falls_back_to_timestamp() {
        let mut state = ConversationState::new();
        assert_eq!(state.update_marker("a1b2c3", 42), Some(42));
        assert_eq!(state.update_marker("0", 0), None);
        assert_eq!(state.checkpoint_marker, Some(42));
    }

    #[test]
    fn stage_names_are_kebab_case() {
        assert_eq!(Stage::AwaitingTaskCompletion.to_string(), "awaiting-task-completion");
    }
}

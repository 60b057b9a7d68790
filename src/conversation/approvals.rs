//! Automatic answers to `ask` turns.

use serde::{Deserialize, Serialize};

use crate::proto::{AskResponseRequest, AskResponseType, ClineAsk};

/// What an ask is requesting permission for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    CommandExecution,
    ToolUse,
    /// Final answer; never answered.
    Completion,
    Other,
}

/// Answer chosen for an ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Structured "yes" button click with no text.
    Accept,
    /// Free-form reply.
    Reply(String),
    Skip,
}

pub fn approval_kind_for_ask(ask: ClineAsk) -> ApprovalKind {
    match ask {
        ClineAsk::Command => ApprovalKind::CommandExecution,
        ClineAsk::Tool => ApprovalKind::ToolUse,
        ClineAsk::CompletionResult => ApprovalKind::Completion,
        _ => ApprovalKind::Other,
    }
}

/// Approves every capability request and answers everything else in text.
#[derive(Debug, Clone)]
pub struct AutoApprover {
    reply_text: String,
}

impl AutoApprover {
    pub fn new(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
        }
    }

    pub fn decide(&self, ask: ClineAsk) -> ApprovalDecision {
        match approval_kind_for_ask(ask) {
            ApprovalKind::CommandExecution | ApprovalKind::ToolUse => ApprovalDecision::Accept,
            ApprovalKind::Completion => ApprovalDecision::Skip,
            ApprovalKind::Other => ApprovalDecision::Reply(self.reply_text.clone()),
        }
    }

    /// The request to send for `ask`, if it gets an answer at all.
    pub fn response_for(&self, ask: ClineAsk) -> Option<AskResponseRequest> {
        match self.decide(ask) {
            ApprovalDecision::Accept => Some(AskResponseRequest::new(AskResponseType::YesButtonClicked, "")),
            ApprovalDecision::Reply(text) => Some(AskResponseRequest::new(AskResponseType::MessageResponse, text)),
            ApprovalDecision::Skip => None,
        }
    }
}

impl Default for AutoApprover {
    fn default() -> Self {
        Self::new("yes")
    }
}

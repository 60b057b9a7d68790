//! The scripted conversation: prompts and per-stage expectations as data.

use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::validation::TextMatcher;

/// 1x1 PNG sent with the opening prompt to exercise image attachments.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

pub fn placeholder_image() -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(PLACEHOLDER_PNG)
    )
}

/// Written into prompts wherever the artifact file name belongs.
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";

/// Full conversation script. Every section has a built-in default, so a
/// script file only needs the sections it changes. Fields left out of a
/// section that is present fall back to that section type's `Default`.
///
/// Prompts may name the task artifact as `{artifact}`; loading fills it in
/// from `task.artifact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default = "Script::template", deny_unknown_fields)]
pub struct Script {
    pub initial_prompt: String,
    pub attachments: Vec<String>,
    pub initial_reply: ReplyStage,
    pub second_reply: ReplyStage,
    pub task: TaskStage,
    pub resume: ResumeStage,
    pub roster: RosterPlan,
}

/// Expectations for one reply and the prompt that follows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplyStage {
    /// Content that satisfies this stage's checkpoint.
    pub expect: TextMatcher,
    /// Content that belongs to the previous stage and must be skipped.
    pub residual: Option<TextMatcher>,
    /// Prompt sent once this stage completes.
    pub follow_up: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskStage {
    /// File the agent is asked to create and open.
    pub artifact: String,
    /// Text sent for asks that take a free-form answer.
    pub approval_text: String,
    pub restore_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResumeStage {
    pub follow_up: String,
    pub expect: TextMatcher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterPlan {
    pub server_name: String,
    pub server_url: String,
    pub timeout_secs: i32,
    pub sse_server_name: String,
    pub sse_server_url: String,
}

impl Default for Script {
    fn default() -> Self {
        Self::template().resolved()
    }
}

impl Script {
    /// Built-in script with placeholders still in place.
    fn template() -> Self {
        let calculator_prompt = format!(
            "Create a simple calculator app by writing its HTML, CSS, and JavaScript code to a file named '{ARTIFACT_PLACEHOLDER}'. \
             Then, use the `execute_command` tool to open this '{ARTIFACT_PLACEHOLDER}' file."
        );
        Self {
            initial_prompt: "whats 2+2".to_string(),
            attachments: vec![placeholder_image()],
            initial_reply: ReplyStage {
                expect: TextMatcher::default()
                    .require_all(["4"])
                    .require_any(["2+2", "="])
                    .forbid_ci(["what's"]),
                residual: None,
                follow_up: "Who is Donald Trump? Describe concisely.".to_string(),
            },
            second_reply: ReplyStage {
                expect: TextMatcher::default().require_any_ci(["trump", "president"]),
                residual: Some(TextMatcher::default().require_any(["2+2", " is 4"])),
                follow_up: calculator_prompt,
            },
            task: TaskStage::default(),
            resume: ResumeStage::default(),
            roster: RosterPlan::default(),
        }
    }

    /// Substitute the artifact name into every prompt.
    fn resolved(mut self) -> Self {
        let artifact = self.task.artifact.clone();
        for prompt in [
            &mut self.initial_prompt,
            &mut self.initial_reply.follow_up,
            &mut self.second_reply.follow_up,
            &mut self.resume.follow_up,
        ] {
            if prompt.contains(ARTIFACT_PLACEHOLDER) {
                *prompt = prompt.replace(ARTIFACT_PLACEHOLDER, &artifact);
            }
        }
        self
    }
}

impl Default for TaskStage {
    fn default() -> Self {
        Self {
            artifact: "calculator.html".to_string(),
            approval_text: "yes".to_string(),
            restore_type: "overwrite".to_string(),
        }
    }
}

impl Default for ResumeStage {
    fn default() -> Self {
        let follow_up = "Okay, now what was the joke about numbers from the calculator task?".to_string();
        Self {
            expect: TextMatcher::default()
                .require_non_empty()
                .forbid_ci([follow_up.clone()])
                .require_any_ci(["joke", "numbers", "calculator"])
                .or_more_words_than(3),
            follow_up,
        }
    }
}

impl Default for RosterPlan {
    fn default() -> Self {
        Self {
            server_name: "e2e-mcp-test-server".to_string(),
            server_url: "http://localhost:6789/e2e-test".to_string(),
            timeout_secs: 25,
            sse_server_name: "test-remote-sse".to_string(),
            sse_server_url: "http://localhost:12345/test-sse-server".to_string(),
        }
    }
}

impl Script {
    /// Load a TOML script, filling anything unspecified from the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let script = Self::from_toml(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded conversation script");
        Ok(script)
    }

    pub fn from_toml(text: &str) -> Result<Self, HarnessError> {
        let script = toml::from_str::<Self>(text)?.resolved();
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        let prompts = [
            ("initial_prompt", &self.initial_prompt),
            ("initial_reply.follow_up", &self.initial_reply.follow_up),
            ("second_reply.follow_up", &self.second_reply.follow_up),
            ("resume.follow_up", &self.resume.follow_up),
            ("task.artifact", &self.task.artifact),
        ];
        for (field, value) in prompts {
            if value.trim().is_empty() {
                return Err(HarnessError::InvalidArgument(format!("{field} must not be empty")));
            }
        }
        // The task checkpoints look for the artifact by name, so the task
        // prompt has to ask for it.
        if !self.second_reply.follow_up.contains(&self.task.artifact) {
            return Err(HarnessError::InvalidArgument(format!(
                "second_reply.follow_up must name task.artifact '{}' (or use {ARTIFACT_PLACEHOLDER})",
                self.task.artifact
            )));
        }
        Ok(())
    }
}

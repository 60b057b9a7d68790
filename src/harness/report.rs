//! Outcome of one run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Phase;
use crate::conversation::{LoopExit, Stage};
use crate::error::HarnessError;
use crate::message_log::MessageLog;

#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Every checkpoint with its final value.
    pub validations: BTreeMap<String, bool>,
    /// Checkpoints whose conjunction decides success.
    pub required: Vec<String>,
    pub log: MessageLog,
    pub exit: Option<LoopExit>,
    /// The one terminal error of the run, if any.
    pub error: Option<HarnessError>,
    pub task_id: Option<String>,
    pub final_stage: Option<Stage>,
    pub backend_logs: Option<String>,
}

impl RunReport {
    pub fn new(phase: Phase, required: Vec<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase,
            started_at: Utc::now(),
            finished_at: None,
            validations: required.iter().map(|name| (name.clone(), false)).collect(),
            required,
            log: MessageLog::new(),
            exit: None,
            error: None,
            task_id: None,
            final_stage: None,
            backend_logs: None,
        }
    }

    pub fn fail(mut self, error: HarnessError) -> Self {
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Required checkpoints that never became true.
    pub fn missing(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|name| !self.validations.get(name.as_str()).copied().unwrap_or(false))
            .map(String::as_str)
            .collect()
    }

    /// No fatal error and every required checkpoint observed.
    pub fn success(&self) -> bool {
        let fatal = self.error.as_ref().is_some_and(HarnessError::is_fatal);
        !fatal && self.missing().is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    /// Checkpoint table plus the terminal error, for the end of a run.
    pub fn render_summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "=== Run summary ({}) ===", self.phase)?;
        writeln!(out, "run id: {}", self.run_id)?;
        if let Some(finished) = self.finished_at {
            let elapsed = finished - self.started_at;
            writeln!(out, "duration: {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0)?;
        }
        if let Some(task_id) = &self.task_id {
            writeln!(out, "task id: {task_id}")?;
        }
        if let Some(stage) = self.final_stage {
            writeln!(out, "final stage: {stage}")?;
        }
        if let Some(exit) = &self.exit {
            writeln!(out, "loop exit: {exit}")?;
        }
        writeln!(out, "events received: {}", self.log.len())?;

        writeln!(out, "checkpoints:")?;
        for (name, observed) in &self.validations {
            let mark = if *observed { "x" } else { " " };
            let tag = if self.is_required(name) { "" } else { " (optional)" };
            writeln!(out, "  [{mark}] {name}{tag}")?;
        }

        if let Some(error) = &self.error {
            writeln!(
                out,
                "error: {error} [{}{}]",
                error.category(),
                if error.is_fatal() { ", fatal" } else { "" }
            )?;
            if let Some(hint) = error.recovery_suggestion().hint() {
                writeln!(out, "hint: {hint}")?;
            }
        }

        let missing = self.missing();
        if !missing.is_empty() {
            writeln!(out, "missing: {}", missing.join(", "))?;
        }
        writeln!(out, "result: {}", if self.success() { "PASSED" } else { "FAILED" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(required: &[&str]) -> RunReport {
        RunReport::new(
            Phase::Conversation,
            required.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn all_required_checkpoints_pass() {
        let mut r = report(&["a", "b"]);
        r.validations.insert("a".into(), true);
        r.validations.insert("b".into(), true);
        assert!(r.success());
        assert_eq!(r.exit_code(), 0);
    }

    #[test]
    fn one_missing_checkpoint_fails() {
        let mut r = report(&["a", "b"]);
        r.validations.insert("a".into(), true);
        assert_eq!(r.missing(), vec!["b"]);
        assert_eq!(r.exit_code(), 1);
    }

    #[test]
    fn optional_checkpoints_do_not_affect_success() {
        let mut r = report(&["a"]);
        r.validations.insert("a".into(), true);
        r.validations.insert("extra".into(), false);
        assert!(r.success());
        assert!(r.render_summary().contains("[ ] extra (optional)"));
    }

    #[test]
    fn fatal_error_fails_even_with_checkpoints() {
        let mut r = report(&["a"]);
        r.validations.insert("a".into(), true);
        let r = r.fail(HarnessError::Authentication("bad key".into()));
        assert!(!r.success());
        let summary = r.render_summary();
        assert!(summary.contains("authentication"), "{summary}");
        assert!(summary.contains("result: FAILED"));
    }

    #[test]
    fn display_matches_rendered_summary() {
        let r = report(&["a"]).fail(HarnessError::timeout("StartTask", 10));
        let shown = format!("{r}");
        assert_eq!(shown, r.render_summary());
        assert!(shown.contains("StartTask timed out after 10ms"), "{shown}");
    }

    #[test]
    fn non_fatal_error_does_not_fail_the_run() {
        let mut r = report(&["a"]);
        r.validations.insert("a".into(), true);
        let r = r.fail(HarnessError::timeout("StartTask", 10));
        assert!(r.success());
    }
}

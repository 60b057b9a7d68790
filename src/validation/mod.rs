//! Named validation checkpoints and their aggregation.

pub mod predicates;

pub use predicates::TextMatcher;

use std::collections::BTreeMap;

/// Well-known checkpoint names.
pub mod checkpoint {
    pub const TASK_STARTED: &str = "task-started";
    pub const INITIAL_ANSWERED: &str = "initial-math-answered";
    pub const SECOND_ANSWERED: &str = "second-reply-answered";
    pub const TOOL_WRITE_SEEN: &str = "tool-write-seen";
    pub const TOOL_EXEC_SEEN: &str = "tool-exec-seen";

    pub const ROSTER_ADD: &str = "roster-add-e2e";
    pub const ROSTER_DISABLE: &str = "roster-disable-e2e";
    pub const ROSTER_ENABLE: &str = "roster-enable-e2e";
    pub const ROSTER_TIMEOUT: &str = "roster-timeout-e2e";
    pub const ROSTER_ADD_SSE: &str = "roster-add-sse";

    pub const RESUME_STARTED: &str = "resume-task-started";
    pub const RESUME_COHERENT: &str = "resume-coherent";

    pub const CONVERSATION: &[&str] = &[
        TASK_STARTED,
        INITIAL_ANSWERED,
        SECOND_ANSWERED,
        TOOL_WRITE_SEEN,
        TOOL_EXEC_SEEN,
    ];
    pub const ROSTER: &[&str] = &[
        ROSTER_ADD,
        ROSTER_DISABLE,
        ROSTER_ENABLE,
        ROSTER_TIMEOUT,
        ROSTER_ADD_SSE,
    ];
    pub const RESUME: &[&str] = &[RESUME_STARTED, RESUME_COHERENT];
}

/// Monotonic set of boolean checkpoints.
///
/// A checkpoint starts false and can only move to true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSet {
    entries: Vec<(String, bool)>,
}

impl ValidationSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            set.declare(name);
        }
        set
    }

    /// Add a checkpoint at false if it is not already known.
    pub fn declare(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.entries.iter().any(|(n, _)| *n == name) {
            self.entries.push((name, false));
        }
    }

    /// Record an observation. `false` never clears an earlier `true`.
    ///
    /// Returns true when this call flipped the checkpoint.
    pub fn record(&mut self, name: &str, observed: bool) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, value)) => {
                let flipped = observed && !*value;
                *value |= observed;
                flipped
            }
            None => {
                self.entries.push((name.to_string(), observed));
                observed
            }
        }
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, v)| n == name && *v)
    }

    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.entries.iter().cloned().collect()
    }

    /// Checkpoints in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// AND over `required`; names never declared count as failed.
    pub fn overall_success<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|name| self.is_set(name.as_ref()))
    }

    /// Required checkpoints that are still false.
    pub fn missing<'a, S: AsRef<str>>(&self, required: &'a [S]) -> Vec<&'a str> {
        required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.is_set(name))
            .collect()
    }
}

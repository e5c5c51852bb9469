//! Terminal states of an agent run

use serde::{Deserialize, Serialize};

/// How a session (or a single task) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The model produced a final answer without requesting more tools
    Done,

    /// The turn budget was exhausted before the task completed.
    /// This is an incomplete-task report, not a crash.
    MaxTurnsExceeded,

    /// The run was cancelled by the user. Tool calls already dispatched
    /// are not rolled back.
    Aborted,
}

impl SessionOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionOutcome::Done => 0,
            SessionOutcome::MaxTurnsExceeded => 2,
            SessionOutcome::Aborted => 130,
        }
    }

    /// Check if the task ran to completion
    pub fn is_complete(&self) -> bool {
        matches!(self, SessionOutcome::Done)
    }
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionOutcome::Done => write!(f, "done"),
            SessionOutcome::MaxTurnsExceeded => write!(f, "incomplete (max turns reached)"),
            SessionOutcome::Aborted => write!(f, "aborted"),
        }
    }
}

/// Result of running a task to a terminal state
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// How the run ended
    pub outcome: SessionOutcome,
    /// The final assistant text (empty for aborted runs)
    pub final_text: String,
}

impl TaskOutcome {
    /// Create a completed outcome with the model's final answer
    pub fn done(final_text: impl Into<String>) -> Self {
        Self {
            outcome: SessionOutcome::Done,
            final_text: final_text.into(),
        }
    }

    /// Create a turn-budget-exhausted outcome
    pub fn max_turns_exceeded() -> Self {
        Self {
            outcome: SessionOutcome::MaxTurnsExceeded,
            final_text: String::new(),
        }
    }

    /// Create an aborted outcome
    pub fn aborted() -> Self {
        Self {
            outcome: SessionOutcome::Aborted,
            final_text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct() {
        assert_eq!(SessionOutcome::Done.exit_code(), 0);
        assert_eq!(SessionOutcome::MaxTurnsExceeded.exit_code(), 2);
        assert_eq!(SessionOutcome::Aborted.exit_code(), 130);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SessionOutcome::Done.to_string(), "done");
        assert_eq!(
            SessionOutcome::MaxTurnsExceeded.to_string(),
            "incomplete (max turns reached)"
        );
    }
}

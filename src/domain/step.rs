//! Execution step record.

use serde::{Deserialize, Serialize};

/// Recorded outcome of one act→observe turn.
///
/// Immutable once appended: the loop controller creates exactly one per
/// iteration and never rewrites history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionStep {
    /// 1-based, strictly increasing step counter
    pub step_number: u32,
    /// The prompt that drove this step (the run's initial request)
    pub action_prompt: String,
    /// Tool executed during this turn, if any
    pub tool_name: Option<String>,
    /// Display-truncated summary of the turn's result
    pub result_summary: String,
    /// Snapshot of the task list at this step, if one was tracked
    pub tasks_snapshot: Option<String>,
}

impl ExecutionStep {
    pub fn new(
        step_number: u32,
        action_prompt: impl Into<String>,
        tool_name: Option<String>,
        result_summary: impl Into<String>,
        tasks_snapshot: Option<String>,
    ) -> Self {
        Self {
            step_number,
            action_prompt: action_prompt.into(),
            tool_name,
            result_summary: result_summary.into(),
            tasks_snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_construction() {
        let step = ExecutionStep::new(1, "do things", Some("read".to_string()), "Read file.txt", None);
        assert_eq!(step.step_number, 1);
        assert_eq!(step.action_prompt, "do things");
        assert_eq!(step.tool_name.as_deref(), Some("read"));
        assert_eq!(step.result_summary, "Read file.txt");
        assert!(step.tasks_snapshot.is_none());
    }

    #[test]
    fn test_step_serialization_roundtrip() {
        let step = ExecutionStep::new(3, "prompt", None, "summary", Some("t1:PENDING".to_string()));
        let json = serde_json::to_string(&step).unwrap();
        let restored: ExecutionStep = serde_json::from_str(&json).unwrap();
        assert_eq!(step, restored);
    }
}

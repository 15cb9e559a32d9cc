//! Loop controller - drives bounded act→observe iterations.
//!
//! Each iteration invokes the collaborator once, records exactly one step,
//! and applies the termination rules in fixed precedence: terminal failure,
//! completion sentinel, stagnation, step limit. All states other than
//! RUNNING are absorbing; a returned [`LoopResult`] is final.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::domain::{ExecutionStep, LoopResult, RunOutcome, TurnResult};
use crate::error::Result;
use crate::report;

/// Display cap applied to each step's recorded summary.
const DISPLAY_WIDTH: usize = 80;

/// Number of prior steps whose summaries are prepended to the prompt.
const CONTEXT_WINDOW: usize = 3;

/// Marker a collaborator emits in its content to signal explicit completion.
pub const COMPLETION_SENTINEL: &str = "TERMINATION_SIGNAL:COMPLETED";

const REASON_COMPLETED: &str = "COMPLETED";
const REASON_STEP_LIMIT: &str = "STEP_LIMIT";

/// One reasoning→tool→observation turn. Implementations may fail with any
/// taxonomy error; the loop reads only the recoverable/terminal distinction.
#[async_trait]
pub trait TurnExecutor: Send + Sync {
    async fn execute(&self, prompt: &str) -> Result<TurnResult>;
}

/// Drives a single-turn collaborator through at most `max_steps` iterations.
pub struct AgentLoop<E: TurnExecutor> {
    max_steps: usize,
    executor: Arc<E>,
}

impl<E: TurnExecutor> AgentLoop<E> {
    /// Create a loop with a step ceiling of `max_steps` (>= 1).
    pub fn new(max_steps: usize, executor: Arc<E>) -> Self {
        Self { max_steps, executor }
    }

    /// Run the loop to an absorbing state. Never fails: collaborator
    /// failures become steps and termination reasons.
    pub async fn run_loop(&self, initial_prompt: &str) -> LoopResult {
        let max = self.max_steps;
        let sentinel = normalize_summary(COMPLETION_SENTINEL);

        let mut steps: Vec<ExecutionStep> = Vec::with_capacity(max);
        let mut terminated = false;
        let mut reason: Option<String> = None;
        let mut previous_display: Option<String> = None;

        for i in 1..=max {
            let step_number = i as u32;
            let prompt = build_prompt(initial_prompt, &steps);
            debug!("Step {i}/{max}: invoking collaborator");

            let (raw, tool_name) = match self.executor.execute(&prompt).await {
                Ok(TurnResult { content, tool_name }) => (content, tool_name),
                Err(err) if !err.is_terminal() => {
                    // Recoverable: the failure message is this turn's
                    // observation and the iteration proceeds normally.
                    debug!("Step {i}: recoverable failure: {err}");
                    (err.to_string(), None)
                }
                Err(err) => {
                    let code = err.reason_code().unwrap_or("SYSTEM_ERROR");
                    warn!("Step {i}: terminal failure, aborting run: {code}");
                    let summary = truncate_display(&format!("{code}: {err}"));
                    steps.push(ExecutionStep::new(step_number, initial_prompt, None, summary, None));
                    terminated = true;
                    reason = Some(code.to_string());
                    break;
                }
            };

            let summary = truncate_display(&raw);

            // Sentinel detection runs on the untruncated content, so a
            // marker past the display boundary still terminates.
            if normalize_summary(&raw).contains(&sentinel) {
                steps.push(ExecutionStep::new(step_number, initial_prompt, tool_name, summary, None));
                terminated = true;
                reason = Some(REASON_COMPLETED.to_string());
                break;
            }

            // Stagnation runs on the displayed text: raw outputs differing
            // only past the truncation boundary are indistinguishable
            // downstream and count as a repeat.
            let normalized_display = normalize_summary(&summary);
            if previous_display.as_deref() == Some(normalized_display.as_str()) {
                debug!("Step {i}: repeated display output, terminating");
                steps.push(ExecutionStep::new(step_number, initial_prompt, tool_name, summary, None));
                terminated = true;
                reason = Some(REASON_COMPLETED.to_string());
                break;
            }
            previous_display = Some(normalized_display);

            steps.push(ExecutionStep::new(step_number, initial_prompt, tool_name, summary, None));
        }

        if !terminated {
            terminated = true;
            reason = Some(REASON_STEP_LIMIT.to_string());
        }

        let aggregated = report::format_steps(&steps, terminated, reason.as_deref());
        let outcome = RunOutcome {
            step_count: steps.len(),
            max_steps: max,
            terminated,
            reason,
        };
        LoopResult {
            steps,
            aggregated,
            outcome,
        }
    }
}

/// Build the turn's prompt: a bounded window of the last prior step
/// summaries, then the original request. Pure over its inputs so tests can
/// drive arbitrary histories.
pub fn build_prompt(initial_prompt: &str, steps: &[ExecutionStep]) -> String {
    if steps.is_empty() {
        return initial_prompt.to_string();
    }
    let mut out = String::from("[Previous Step Summaries]\n");
    let start = steps.len().saturating_sub(CONTEXT_WINDOW);
    for step in &steps[start..] {
        out.push_str(&format!("Step {}: {}\n", step.step_number, step.result_summary));
    }
    out.push_str("\n[User Request]\n");
    out.push_str(initial_prompt);
    out
}

/// Strip non-alphanumeric characters, collapse whitespace, lowercase.
fn normalize_summary(summary: &str) -> String {
    let stripped: String = summary
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn truncate_display(content: &str) -> String {
    if content.chars().count() <= DISPLAY_WIDTH {
        content.to_string()
    } else {
        content.chars().take(DISPLAY_WIDTH).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Scripted collaborator: pops one canned response per turn and records
    /// the prompts it was given.
    struct ScriptedExecutor {
        script: Mutex<Vec<Result<TurnResult>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn new(script: Vec<Result<TurnResult>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn of_contents(contents: &[&str]) -> Arc<Self> {
            Self::new(contents.iter().map(|c| Ok(TurnResult::without_tool(*c))).collect())
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TurnExecutor for ScriptedExecutor {
        async fn execute(&self, prompt: &str) -> Result<TurnResult> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                Ok(TurnResult::without_tool(format!("filler {}", self.prompts.lock().unwrap().len())))
            } else {
                script.remove(0)
            }
        }
    }

    #[tokio::test]
    async fn test_step_limit_with_distinct_outputs() {
        let executor = ScriptedExecutor::of_contents(&["one", "two", "three", "four"]);
        let result = AgentLoop::new(4, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 4);
        assert_eq!(result.outcome.reason.as_deref(), Some("STEP_LIMIT"));
        assert!(result.outcome.terminated);
        let numbers: Vec<u32> = result.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_two_distinct_steps_hit_step_limit() {
        let executor = ScriptedExecutor::of_contents(&["foo", "bar"]);
        let result = AgentLoop::new(2, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("STEP_LIMIT"));
    }

    #[tokio::test]
    async fn test_sentinel_stops_early() {
        let executor =
            ScriptedExecutor::of_contents(&["working", "done TERMINATION_SIGNAL:COMPLETED", "never reached"]);
        let result = AgentLoop::new(10, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_sentinel_detected_past_display_boundary() {
        let long_content = format!("{} {}", "x".repeat(100), COMPLETION_SENTINEL);
        let executor = ScriptedExecutor::new(vec![Ok(TurnResult::without_tool(long_content))]);
        let result = AgentLoop::new(5, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 1);
        assert_eq!(result.outcome.reason.as_deref(), Some("COMPLETED"));
        assert_eq!(result.steps[0].result_summary.chars().count(), 80);
    }

    #[tokio::test]
    async fn test_stagnation_stops_at_second_repeat() {
        let executor = ScriptedExecutor::of_contents(&["A", "A", "B"]);
        let result = AgentLoop::new(3, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_stagnation_ignores_punctuation_and_case() {
        let executor = ScriptedExecutor::of_contents(&["Done: step #1!", "done STEP 1"]);
        let result = AgentLoop::new(5, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_stagnation_uses_displayed_text_not_raw() {
        // Differ only past the 80-char display boundary
        let base = "r".repeat(80);
        let first = format!("{base} tail one");
        let second = format!("{base} tail two");
        let executor = ScriptedExecutor::new(vec![
            Ok(TurnResult::without_tool(first)),
            Ok(TurnResult::without_tool(second)),
        ]);
        let result = AgentLoop::new(5, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_distinct_within_display_window_continues() {
        let executor = ScriptedExecutor::of_contents(&["result alpha", "result beta", "result gamma"]);
        let result = AgentLoop::new(3, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 3);
        assert_eq!(result.outcome.reason.as_deref(), Some("STEP_LIMIT"));
    }

    #[tokio::test]
    async fn test_recoverable_failure_continues_to_step_limit() {
        let executor = ScriptedExecutor::new(vec![
            Ok(TurnResult::without_tool("step one ok")),
            Err(AgentError::tool("File not found: ghost.txt")),
            Ok(TurnResult::without_tool("step three ok")),
            Ok(TurnResult::without_tool("step four ok")),
            Ok(TurnResult::without_tool("step five ok")),
        ]);
        let result = AgentLoop::new(5, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 5);
        assert_eq!(result.outcome.reason.as_deref(), Some("STEP_LIMIT"));
        assert_eq!(result.steps[1].result_summary, "File not found: ghost.txt");
        assert!(result.steps[1].tool_name.is_none());
    }

    #[tokio::test]
    async fn test_terminal_failure_stops_with_reason_code() {
        let executor = ScriptedExecutor::new(vec![
            Ok(TurnResult::without_tool("fine")),
            Err(AgentError::SecurityViolation {
                path: PathBuf::from("/etc/passwd"),
                root: PathBuf::from("/repo"),
            }),
        ]);
        let result = AgentLoop::new(10, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("SECURITY_VIOLATION"));
        assert!(result.steps[1].result_summary.starts_with("SECURITY_VIOLATION: "));
        assert!(result.steps[1].result_summary.chars().count() <= 80);
    }

    #[tokio::test]
    async fn test_system_failure_reason_code() {
        let executor = ScriptedExecutor::new(vec![Err(AgentError::system("out of memory"))]);
        let result = AgentLoop::new(3, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 1);
        assert_eq!(result.outcome.reason.as_deref(), Some("SYSTEM_ERROR"));
        assert_eq!(result.steps[0].result_summary, "SYSTEM_ERROR: out of memory");
    }

    #[tokio::test]
    async fn test_terminal_failure_overrides_sentinel_in_message() {
        // A terminal failure whose message happens to contain the sentinel
        // still aborts with the failure's reason code.
        let executor = ScriptedExecutor::new(vec![Err(AgentError::system(format!(
            "crashed while printing {COMPLETION_SENTINEL}"
        )))]);
        let result = AgentLoop::new(3, executor).run_loop("task").await;

        assert_eq!(result.outcome.reason.as_deref(), Some("SYSTEM_ERROR"));
    }

    #[tokio::test]
    async fn test_recoverable_failure_message_can_trigger_stagnation() {
        let executor = ScriptedExecutor::new(vec![
            Err(AgentError::tool("same failure")),
            Err(AgentError::tool("same failure")),
        ]);
        let result = AgentLoop::new(5, executor).run_loop("task").await;

        assert_eq!(result.outcome.step_count, 2);
        assert_eq!(result.outcome.reason.as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_first_prompt_is_initial_prompt_only() {
        let executor = ScriptedExecutor::of_contents(&["a", "b"]);
        AgentLoop::new(2, executor.clone()).run_loop("fix the bug").await;

        let prompts = executor.prompts();
        assert_eq!(prompts[0], "fix the bug");
        assert!(prompts[1].starts_with("[Previous Step Summaries]\n"));
        assert!(prompts[1].contains("Step 1: a"));
        assert!(prompts[1].ends_with("[User Request]\nfix the bug"));
    }

    #[tokio::test]
    async fn test_context_window_holds_last_three_steps() {
        let executor = ScriptedExecutor::of_contents(&["s1", "s2", "s3", "s4", "s5"]);
        AgentLoop::new(5, executor.clone()).run_loop("task").await;

        let prompts = executor.prompts();
        let fifth = &prompts[4];
        assert!(!fifth.contains("Step 1: s1"));
        assert!(fifth.contains("Step 2: s2"));
        assert!(fifth.contains("Step 3: s3"));
        assert!(fifth.contains("Step 4: s4"));
    }

    #[tokio::test]
    async fn test_tool_name_recorded_on_steps() {
        let executor = ScriptedExecutor::new(vec![
            Ok(TurnResult::with_tool("Read main.rs", "read")),
            Ok(TurnResult::without_tool("thinking")),
        ]);
        let result = AgentLoop::new(2, executor).run_loop("task").await;

        assert_eq!(result.steps[0].tool_name.as_deref(), Some("read"));
        assert!(result.steps[1].tool_name.is_none());
    }

    #[tokio::test]
    async fn test_aggregated_text_present_and_final() {
        let executor = ScriptedExecutor::of_contents(&["only"]);
        let result = AgentLoop::new(1, executor).run_loop("task").await;

        assert!(result.aggregated.starts_with("HEADER: "));
        assert!(result.aggregated.contains("STEP 1 | tool=- | summary=\"only\""));
        assert!(result.aggregated.ends_with("TOTAL_STEPS=1 TERMINATED=true REASON=STEP_LIMIT"));
    }

    #[test]
    fn test_build_prompt_empty_history() {
        assert_eq!(build_prompt("do it", &[]), "do it");
    }

    #[test]
    fn test_normalize_summary() {
        assert_eq!(normalize_summary("Done: step #1!"), "done step 1");
        assert_eq!(normalize_summary("  A   lot\t of\nspace  "), "a lot of space");
        assert_eq!(normalize_summary("***"), "");
    }

    #[test]
    fn test_truncate_display() {
        assert_eq!(truncate_display("short"), "short");
        let long = "y".repeat(100);
        assert_eq!(truncate_display(&long).chars().count(), 80);
    }
}

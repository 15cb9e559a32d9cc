//! Loop execution outcome types.

use serde::{Deserialize, Serialize};

use super::step::ExecutionStep;

/// Final state of a completed run.
///
/// Invariants: `terminated == true` implies `reason` is set, and
/// `step_count <= max_steps`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    /// Number of steps actually executed
    pub step_count: usize,
    /// Configured step ceiling for the run
    pub max_steps: usize,
    /// Whether an absorbing state was reached (always true once returned)
    pub terminated: bool,
    /// Termination reason code (COMPLETED, STEP_LIMIT, or a terminal
    /// failure's reason code)
    pub reason: Option<String>,
}

/// Read-only snapshot of a finished run: the ordered steps, the formatted
/// audit text, and the final outcome. Produced exactly once per `run_loop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoopResult {
    pub steps: Vec<ExecutionStep>,
    pub aggregated: String,
    pub outcome: RunOutcome,
}

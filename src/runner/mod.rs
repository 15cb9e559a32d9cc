//! Loop controller module.
//!
//! Provides the bounded execution loop (AgentLoop), the collaborator seam
//! (TurnExecutor), and the completion sentinel constant.

mod loop_runner;

pub use loop_runner::{AgentLoop, COMPLETION_SENTINEL, TurnExecutor, build_prompt};

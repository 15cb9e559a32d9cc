//! Agent configuration - supplied once at construction.
//!
//! Loading from files or the environment is the caller's concern; this crate
//! only consumes the resolved values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Resource ceilings and sandbox root for a single agent instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum number of loop iterations per run
    pub max_steps: usize,
    /// Maximum lines returned by a single read
    pub max_file_lines: usize,
    /// Maximum entries returned by a single list
    pub max_list_results: usize,
    /// Maximum matches returned by a single search
    pub max_search_results: usize,
    /// Sandbox root - no file operation may resolve outside this directory
    pub repo_root: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_file_lines: 2000,
            max_list_results: 500,
            max_search_results: 200,
            repo_root: PathBuf::from("."),
        }
    }
}

impl AgentConfig {
    /// Check that every ceiling is usable. Zero ceilings would make every
    /// operation a no-op, so they are rejected up front.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps < 1 {
            return Err(AgentError::validation("max_steps", "must be >= 1"));
        }
        if self.max_file_lines < 1 {
            return Err(AgentError::validation("max_file_lines", "must be > 0"));
        }
        if self.max_list_results < 1 {
            return Err(AgentError::validation("max_list_results", "must be > 0"));
        }
        if self.max_search_results < 1 {
            return Err(AgentError::validation("max_search_results", "must be > 0"));
        }
        Ok(())
    }
}

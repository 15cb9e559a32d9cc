//! Single-turn result from the collaborator.

use serde::{Deserialize, Serialize};

/// Raw output of one collaborator invocation: the textual result and the
/// tool that was executed during the turn, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnResult {
    pub content: String,
    pub tool_name: Option<String>,
}

impl TurnResult {
    /// Turn that produced text without executing a tool.
    pub fn without_tool(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_name: None,
        }
    }

    /// Turn that executed a tool. Blank tool names collapse to `None`.
    pub fn with_tool(content: impl Into<String>, tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self {
            content: content.into(),
            tool_name: if tool_name.trim().is_empty() { None } else { Some(tool_name) },
        }
    }
}

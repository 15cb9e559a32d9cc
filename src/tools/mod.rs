//! Sandboxed file-operation tool set
//!
//! Four tools (read, list, search, replace) sharing a ToolContext that
//! carries the sandbox validator and the resource ceilings. Every path
//! argument goes through the validator before any filesystem access.

mod list_dir;
mod read_file;
mod replace;
mod search;

pub use list_dir::ListDirTool;
pub use read_file::ReadFileTool;
pub use replace::ReplaceTool;
pub use search::SearchTool;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::sandbox::PathValidator;

/// Resource ceilings shared by the tool set.
#[derive(Debug, Clone, Copy)]
pub struct ToolLimits {
    pub max_file_lines: usize,
    pub max_list_results: usize,
    pub max_search_results: usize,
}

/// Execution context shared by all tools. Cheap to clone and safe to share
/// read-only across concurrent runs.
#[derive(Clone)]
pub struct ToolContext {
    pub validator: PathValidator,
    pub limits: ToolLimits,
}

impl ToolContext {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            validator: PathValidator::new(&config.repo_root),
            limits: ToolLimits {
                max_file_lines: config.max_file_lines,
                max_list_results: config.max_list_results,
                max_search_results: config.max_search_results,
            },
        }
    }
}

/// A tool callable by the collaborator
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used for dispatch
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool. Failures are taxonomy-classified `AgentError`s;
    /// nothing uncategorized escapes.
    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput>;
}

/// Success payload from tool execution: a human-readable message plus
/// optional structured data.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub message: String,
    pub data: Option<Value>,
}

impl ToolOutput {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

/// The four file tools behind one dispatch surface.
pub struct ToolSet {
    ctx: ToolContext,
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            ctx: ToolContext::new(config),
            tools: vec![
                Arc::new(ReadFileTool),
                Arc::new(ListDirTool),
                Arc::new(SearchTool),
                Arc::new(ReplaceTool),
            ],
        }
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Route a call to the named tool.
    pub async fn execute(&self, name: &str, input: Value) -> Result<ToolOutput> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| AgentError::validation("tool", format!("unknown tool '{name}'")))?;
        tool.execute(input, &self.ctx).await
    }
}

/// Extract a required string parameter.
pub(crate) fn require_str<'a>(input: &'a Value, key: &str) -> Result<&'a str> {
    input[key]
        .as_str()
        .ok_or_else(|| AgentError::validation(key, "is required"))
}

/// Extract an optional integer parameter, rejecting non-integer values.
pub(crate) fn optional_int(input: &Value, key: &str) -> Result<Option<i64>> {
    match &input[key] {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AgentError::validation(key, "must be an integer")),
        _ => Err(AgentError::validation(key, "must be an integer")),
    }
}

/// Root-relative display form of a validated path.
pub(crate) fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

//! list tool - directory listings and glob matching, bounded by the result ceiling

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolOutput, relative_display, require_str};
use crate::error::{AgentError, Result};

pub struct ListDirTool;

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &'static str {
        "list"
    }

    fn description(&self) -> &'static str {
        "List directory children, or glob-matched paths when the input contains wildcards."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path or glob pattern relative to the sandbox root"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let pattern = require_str(&input, "path")?;

        let is_glob = pattern.contains('*') || pattern.contains('?');
        let mut entries = if is_glob {
            list_glob(pattern, ctx)?
        } else {
            list_directory(pattern, ctx).await?
        };
        entries.sort();

        let max = ctx.limits.max_list_results;
        let truncated = entries.len() > max;
        if truncated {
            entries.truncate(max);
        }

        let mut message = format!("Found {} items matching '{pattern}'", entries.len());
        if truncated {
            message.push_str(&format!(" [TRUNCATED: first {max} items]"));
        }

        Ok(ToolOutput::with_data(
            message,
            json!({"entries": entries, "truncated": truncated}),
        ))
    }
}

async fn list_directory(path: &str, ctx: &ToolContext) -> Result<Vec<String>> {
    let dir = ctx.validator.validate(path)?;

    if !dir.exists() {
        return Err(AgentError::tool(format!("Directory not found: {path}")));
    }
    if !dir.is_dir() {
        return Err(AgentError::validation("path", format!("not a directory: {path}")));
    }

    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| AgentError::tool(format!("Failed to list directory '{path}': {e}")))?;
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| AgentError::tool(format!("Failed to list directory '{path}': {e}")))?
    {
        entries.push(relative_display(&entry.path(), ctx.validator.root()));
    }
    Ok(entries)
}

fn list_glob(pattern: &str, ctx: &ToolContext) -> Result<Vec<String>> {
    // The security boundary is the longest literal prefix before the first
    // wildcard; the walk cannot start higher than what validates here.
    let base = literal_prefix(pattern);
    ctx.validator.validate(&base)?;

    let root = ctx.validator.root();
    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        root.join(pattern).to_string_lossy().into_owned()
    };

    let paths = glob::glob(&full_pattern)
        .map_err(|e| AgentError::validation("path", format!("invalid glob pattern: {e}")))?;

    Ok(paths
        .filter_map(|entry| entry.ok())
        .filter(|p| p.starts_with(root))
        .map(|p| relative_display(&p, root))
        .collect())
}

/// Longest literal path prefix before the first wildcard character. With no
/// separator before the wildcard the search root is the current directory.
fn literal_prefix(pattern: &str) -> String {
    let glob_idx = pattern
        .find(['*', '?'])
        .unwrap_or(pattern.len());
    let before = &pattern[..glob_idx];
    match before.rfind(['/', '\\']) {
        Some(sep) => before[..=sep].to_string(),
        None => ".".to_string(),
    }
}

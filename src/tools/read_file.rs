//! read tool - file slices with line numbers, bounded by the line ceiling

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolOutput, optional_int, require_str};
use crate::error::{AgentError, Result};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read"
    }

    fn description(&self) -> &'static str {
        "Read a file's contents with line numbers, optionally restricted to a 1-based line range."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the sandbox root"
                },
                "start_line": {
                    "type": "integer",
                    "description": "First line to read (1-based, default: 1)"
                },
                "end_line": {
                    "type": "integer",
                    "description": "Last line to read (1-based, default: end of file)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = require_str(&input, "path")?;
        let start = optional_int(&input, "start_line")?;
        let end = optional_int(&input, "end_line")?;

        let file_path = ctx.validator.validate(path)?;

        if !file_path.exists() {
            return Err(AgentError::tool(format!("File not found: {path}")));
        }
        if !file_path.is_file() {
            return Err(AgentError::tool(format!("Path is not a regular file: {path}")));
        }

        let content = tokio::fs::read_to_string(&file_path)
            .await
            .map_err(|e| AgentError::tool(format!("Failed to read file '{path}': {e}")))?;
        let all_lines: Vec<&str> = content.lines().collect();
        let total = all_lines.len();

        if total == 0 {
            return Ok(ToolOutput::with_data(
                format!("Read {path} (empty file: 0 lines)"),
                json!({"content": "", "start_line": 0, "end_line": 0, "total_lines": 0, "truncated": false}),
            ));
        }

        let start_line = match start {
            Some(s) if s < 1 => return Err(AgentError::validation("start_line", "must be >= 1")),
            Some(s) => s as usize,
            None => 1,
        };
        let end_line = match end {
            Some(e) if e < start_line as i64 => {
                return Err(AgentError::validation("end_line", "must be >= start_line"));
            }
            Some(e) => (e as usize).min(total),
            None => total,
        };
        if start_line > total {
            return Err(AgentError::validation(
                "start_line",
                format!("{start_line} exceeds file length ({total} lines)"),
            ));
        }

        let requested = end_line - start_line + 1;
        let max = ctx.limits.max_file_lines;
        let truncated = requested > max;
        let shown = requested.min(max);
        let selected = &all_lines[start_line - 1..start_line - 1 + shown];

        let mut message = format!(
            "Read {path} (lines {start_line}-{} of {total} total)",
            start_line + shown - 1
        );
        if truncated {
            message.push_str(&format!(
                " [TRUNCATED: showing first {max} lines, {} more available]",
                requested - max
            ));
        }

        Ok(ToolOutput::with_data(
            message,
            json!({
                "content": format_with_line_numbers(selected, start_line),
                "start_line": start_line,
                "end_line": start_line + shown - 1,
                "total_lines": total,
                "truncated": truncated,
            }),
        ))
    }
}

/// Width-aligned `"<n> | <line>"` rendering.
fn format_with_line_numbers(lines: &[&str], start: usize) -> String {
    let width = (start + lines.len().saturating_sub(1)).to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} | {}", start + i, line))
        .collect::<Vec<_>>()
        .join("\n")
}

//! replace tool - exact, unique substring substitution

use async_trait::async_trait;
use log::info;
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolOutput, require_str};
use crate::error::{AgentError, Result};

/// Display cap for old/new strings in the success message.
const DISPLAY_WIDTH: usize = 30;

pub struct ReplaceTool;

#[async_trait]
impl Tool for ReplaceTool {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn description(&self) -> &'static str {
        "Replace an exact string in a file. The string must occur exactly once."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the sandbox root"
                },
                "old_string": {
                    "type": "string",
                    "description": "Exact string to find; must be unique in the file"
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement string"
                }
            },
            "required": ["path", "old_string", "new_string"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let path = require_str(&input, "path")?;
        let old_string = require_str(&input, "old_string")?;
        let new_string = require_str(&input, "new_string")?;

        if old_string.is_empty() {
            return Err(AgentError::validation("old_string", "cannot be empty"));
        }
        if old_string == new_string {
            return Err(AgentError::validation(
                "new_string",
                "is identical to old_string - no replacement needed",
            ));
        }

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

        let occurrences = content.matches(old_string).count();
        if occurrences == 0 {
            return Err(AgentError::validation(
                "old_string",
                format!("'{old_string}' not found in file"),
            ));
        }
        if occurrences > 1 {
            return Err(AgentError::validation(
                "old_string",
                format!("'{old_string}' appears {occurrences} times (must be unique for safety)"),
            ));
        }

        let new_content = content.replacen(old_string, new_string, 1);
        tokio::fs::write(&file_path, &new_content)
            .await
            .map_err(|e| AgentError::tool(format!("Failed to write file '{path}': {e}")))?;

        info!("Replaced unique occurrence in {}", file_path.display());
        Ok(ToolOutput::message(format!(
            "Replaced '{}' with '{}' in {path}",
            truncate_for_display(old_string),
            truncate_for_display(new_string),
        )))
    }
}

fn truncate_for_display(text: &str) -> String {
    if text.chars().count() <= DISPLAY_WIDTH {
        text.to_string()
    } else {
        let capped: String = text.chars().take(DISPLAY_WIDTH).collect();
        format!("{capped}...")
    }
}

//! search tool - literal or regex matching over files, bounded by the result ceiling

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use regex::{Regex, RegexBuilder};
use serde_json::{Value, json};

use super::{Tool, ToolContext, ToolOutput, relative_display, require_str};
use crate::error::{AgentError, Result};

/// Snippet cap per match line.
const SNIPPET_WIDTH: usize = 100;

pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        "search"
    }

    fn description(&self) -> &'static str {
        "Search file contents for a literal string or regex, in one file or recursively in a directory."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Text or regex to search for"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search, relative to the sandbox root"
                },
                "is_regex": {
                    "type": "boolean",
                    "description": "Treat pattern as a regex (default: false, literal)"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Match case-sensitively (default: false)"
                }
            },
            "required": ["pattern", "path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let pattern = require_str(&input, "pattern")?;
        if pattern.is_empty() {
            return Err(AgentError::validation("pattern", "cannot be empty"));
        }
        let path = require_str(&input, "path")?;
        let is_regex = input["is_regex"].as_bool().unwrap_or(false);
        let case_sensitive = input["case_sensitive"].as_bool().unwrap_or(false);

        let search_path = ctx.validator.validate(path)?;
        if !search_path.exists() {
            return Err(AgentError::tool(format!("Path not found: {path}")));
        }

        let source = if is_regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };
        let re = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| AgentError::validation("pattern", format!("invalid regex: {e}")))?;

        let limit = ctx.limits.max_search_results;
        let root = ctx.validator.root();
        let mut matches = Vec::new();

        let truncated = if search_path.is_file() {
            scan_file(&search_path, &re, root, limit, &mut matches)
        } else if search_path.is_dir() {
            scan_directory(&search_path, &re, root, limit, &mut matches)?
        } else {
            return Err(AgentError::tool(format!("Path is neither file nor directory: {path}")));
        };

        let mut message = format!("Found {} matches for '{pattern}' in {path}", matches.len());
        if truncated {
            message.push_str(&format!(" [TRUNCATED: showing first {limit} results]"));
        }

        Ok(ToolOutput::with_data(
            message,
            json!({"matches": matches, "truncated": truncated}),
        ))
    }
}

/// Scan one file, appending `path:line:snippet` entries up to `limit`.
///
/// Returns true when the ceiling cut the scan short: the limit was reached
/// with lines of this file still unscanned, or a further match was found
/// once the limit was already full. Reaching the limit exactly on the last
/// line is not truncation.
fn scan_file(file: &Path, re: &Regex, root: &Path, limit: usize, matches: &mut Vec<String>) -> bool {
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            // Unreadable/binary files are skipped, matching unit is the line
            debug!("Skipping unsearchable file {}: {}", file.display(), e);
            return false;
        }
    };
    let lines: Vec<&str> = content.lines().collect();
    let rel = relative_display(file, root);

    for (idx, line) in lines.iter().enumerate() {
        if !re.is_match(line) {
            continue;
        }
        if matches.len() >= limit {
            return true;
        }
        matches.push(format!("{}:{}:{}", rel, idx + 1, snippet(line)));
        if matches.len() == limit {
            return idx + 1 < lines.len();
        }
    }
    false
}

/// Recursive directory scan over regular files in sorted order.
fn scan_directory(
    dir: &Path,
    re: &Regex,
    root: &Path,
    limit: usize,
    matches: &mut Vec<String>,
) -> Result<bool> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    for (i, file) in files.iter().enumerate() {
        if matches.len() >= limit {
            // Ceiling already reached: any match left in the remaining
            // files flips the flag; none means the ceiling landed exactly
            // on the end of the scannable input.
            let more = files[i..].iter().any(|f| contains_match(f, re));
            return Ok(more);
        }
        if scan_file(file, re, root, limit, matches) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AgentError::tool(format!("Failed to read directory '{}': {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| AgentError::tool(format!("Failed to read directory entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn contains_match(file: &Path, re: &Regex) -> bool {
    match std::fs::read_to_string(file) {
        Ok(content) => content.lines().any(|line| re.is_match(line)),
        Err(_) => false,
    }
}

fn snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() > SNIPPET_WIDTH {
        let capped: String = trimmed.chars().take(SNIPPET_WIDTH).collect();
        format!("{capped}...")
    } else {
        trimmed.to_string()
    }
}

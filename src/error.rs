//! Error types for agentloop
//!
//! A single closed taxonomy drives the loop's continue/abort decision. Every
//! failure crossing a tool or loop boundary is one of these variants; the
//! loop controller reads only `is_terminal()` and `reason_code()`, never
//! concrete variants.

use std::path::PathBuf;

use thiserror::Error;

/// Reason code attached to security violations.
pub const REASON_SECURITY_VIOLATION: &str = "SECURITY_VIOLATION";

/// Reason code attached to unclassified system failures.
pub const REASON_SYSTEM_ERROR: &str = "SYSTEM_ERROR";

/// All failure classes that can cross a tool or loop boundary.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Input validation failed for a named parameter. Recoverable: the loop
    /// continues with the message as the next observation.
    #[error("Validation failed for '{parameter}': {message}")]
    Validation { parameter: String, message: String },

    /// Tool execution failed (missing file, unreadable directory, I/O
    /// error). Recoverable.
    #[error("{message}")]
    ToolExecution { message: String },

    /// A path resolved outside the sandbox root. Terminal: the loop aborts
    /// with reason `SECURITY_VIOLATION`.
    #[error("Path '{}' is outside repository root '{}'", .path.display(), .root.display())]
    SecurityViolation { path: PathBuf, root: PathBuf },

    /// Unrecoverable runtime failure. Terminal: the loop aborts with reason
    /// `SYSTEM_ERROR`.
    #[error("{message}")]
    System { message: String },
}

impl AgentError {
    /// Shorthand for a validation failure on a named parameter.
    pub fn validation(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a recoverable tool execution failure.
    pub fn tool(message: impl Into<String>) -> Self {
        Self::ToolExecution { message: message.into() }
    }

    /// Shorthand for a terminal system failure.
    pub fn system(message: impl Into<String>) -> Self {
        Self::System { message: message.into() }
    }

    /// Whether this failure must abort the loop immediately.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SecurityViolation { .. } | Self::System { .. })
    }

    /// Fixed reason code for terminal failures; `None` for recoverable ones.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::SecurityViolation { .. } => Some(REASON_SECURITY_VIOLATION),
            Self::System { .. } => Some(REASON_SYSTEM_ERROR),
            Self::Validation { .. } | Self::ToolExecution { .. } => None,
        }
    }
}

/// Result type alias for agentloop operations
pub type Result<T> = std::result::Result<T, AgentError>;

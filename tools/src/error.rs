//! Tool invocation errors
//!
//! Every error carries the name of the tool that produced it so the reason
//! recorded on a dead request can be traced back to one agent.

use thiserror::Error;

/// Errors raised while invoking an external scanning tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} could not be launched: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed ({}): {message}", exit_label(.code))]
    Exit {
        tool: String,
        code: Option<i32>,
        message: String,
    },

    #[error("{tool} output exceeded the {limit} byte capture limit")]
    OutputLimit { tool: String, limit: usize },

    #[error("{tool} timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    #[error("{tool} reported a misformatted version: {raw:?}")]
    VersionFormat { tool: String, raw: String },

    #[error("I/O error while running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Name of the tool the error belongs to
    pub fn tool(&self) -> &str {
        match self {
            ToolError::Launch { tool, .. }
            | ToolError::Exit { tool, .. }
            | ToolError::OutputLimit { tool, .. }
            | ToolError::Timeout { tool, .. }
            | ToolError::VersionFormat { tool, .. }
            | ToolError::Io { tool, .. } => tool,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

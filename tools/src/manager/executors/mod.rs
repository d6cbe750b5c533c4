//! Tool Executors Module
//!
//! Maps raw subprocess outcomes onto [`ToolError`]s that name the agent
//! which produced them.

use std::path::Path;
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::tool_models::RawOutput;

pub mod subprocess;
use subprocess::{ExecError, ExecutionLimits, SubprocessExecutor};

#[cfg(test)]
mod tests;

/// Tool execution functions
pub struct ToolExecutors;

impl ToolExecutors {
    /// Run `program` inside `agent_dir` and return its stdout
    ///
    /// Any launch failure, non-zero exit, timeout or output overflow is a
    /// fatal error for the caller.
    pub async fn run_agent(
        tool: &str,
        program: &Path,
        agent_dir: &Path,
        args: &[String],
        limits: &ExecutionLimits,
    ) -> Result<RawOutput> {
        let parameters = args.join(" ");
        debug!("Running {} {}", tool, parameters);

        let result = SubprocessExecutor::execute_command(program, args, Some(agent_dir), limits)
            .await
            .map_err(|e| Self::map_exec_error(tool, e))?;

        if !result.success {
            let message = failure_message(&result.stderr, &result.stdout, result.exit_code);
            debug!("{} run failed: {}", tool, message);
            return Err(ToolError::Exit {
                tool: tool.to_string(),
                code: result.exit_code,
                message,
            });
        }

        Ok(RawOutput {
            stdout: result.stdout,
            parameters,
            duration_ms: result.duration_ms,
        })
    }

    fn map_exec_error(tool: &str, err: ExecError) -> ToolError {
        let tool = tool.to_string();
        match err {
            ExecError::Spawn(source) => ToolError::Launch { tool, source },
            ExecError::OutputLimit(limit) => ToolError::OutputLimit { tool, limit },
            ExecError::Timeout(timeout) => ToolError::Timeout {
                tool,
                timeout_ms: timeout.as_millis() as u64,
            },
            ExecError::Io(source) => ToolError::Io { tool, source },
        }
    }
}

/// Pick the most useful diagnostic from a failed run
fn failure_message(stderr: &str, stdout: &str, exit_code: Option<i32>) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    match exit_code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

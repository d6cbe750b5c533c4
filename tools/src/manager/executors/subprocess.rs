//! Subprocess Execution Module
//!
//! This module provides real subprocess execution for the scanning agents.
//! Standard output is captured up to a fixed cap; going over the cap kills
//! the child instead of truncating.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Default stdout capture cap (5000 KiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 5000 * 1024;

/// Errors from the subprocess layer
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] io::Error),

    #[error("output exceeded {0} bytes")]
    OutputLimit(usize),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Resource limits applied to one execution
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    /// Maximum bytes of stdout captured before the child is killed
    pub max_output_bytes: usize,
    /// Optional wall-clock deadline
    pub timeout: Option<Duration>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Execution result from a subprocess
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the execution was successful
    pub success: bool,
    /// Exit code of the process
    pub exit_code: Option<i32>,
    /// Standard output content
    pub stdout: String,
    /// Standard error content (truncated to the output cap)
    pub stderr: String,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

enum Capture {
    Complete {
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        status: ExitStatus,
    },
    Overflow,
}

/// Subprocess executor for running external tools
pub struct SubprocessExecutor;

impl SubprocessExecutor {
    /// Execute a program with arguments, without a shell
    pub async fn execute_command(
        program: &Path,
        args: &[String],
        working_dir: Option<&Path>,
        limits: &ExecutionLimits,
    ) -> Result<ExecutionResult, ExecError> {
        let start_time = Instant::now();

        debug!("Executing {} with args: {:?}", program.display(), args);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(ExecError::Spawn)?;

        let captured = match limits.timeout {
            Some(timeout) => {
                let bounded =
                    tokio::time::timeout(timeout, capture(&mut child, limits.max_output_bytes))
                        .await;
                match bounded {
                    Ok(captured) => captured?,
                    Err(_) => {
                        warn!("{} timed out after {:?}", program.display(), timeout);
                        let _ = child.kill().await;
                        return Err(ExecError::Timeout(timeout));
                    }
                }
            }
            None => capture(&mut child, limits.max_output_bytes).await?,
        };

        let (stdout, stderr, status) = match captured {
            Capture::Complete {
                stdout,
                stderr,
                status,
            } => (stdout, stderr, status),
            Capture::Overflow => {
                warn!(
                    "{} exceeded the {} byte output cap",
                    program.display(),
                    limits.max_output_bytes
                );
                let _ = child.kill().await;
                return Err(ExecError::OutputLimit(limits.max_output_bytes));
            }
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let success = status.success();
        let exit_code = status.code();

        if success {
            debug!("{} completed in {}ms", program.display(), duration_ms);
        } else {
            warn!(
                "{} failed with exit code {:?} in {}ms",
                program.display(),
                exit_code,
                duration_ms
            );
        }

        Ok(ExecutionResult {
            success,
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            duration_ms,
        })
    }
}

/// Read stdout up to `limit` bytes while draining stderr on a separate task
async fn capture(child: &mut Child, limit: usize) -> io::Result<Capture> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr was not captured"))?;

    let stderr_task = tokio::spawn(drain(stderr, limit));

    let mut stdout_buf = Vec::new();
    stdout
        .take(limit as u64 + 1)
        .read_to_end(&mut stdout_buf)
        .await?;

    if stdout_buf.len() > limit {
        stderr_task.abort();
        return Ok(Capture::Overflow);
    }

    let status = child.wait().await?;
    let stderr_buf = stderr_task
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

    Ok(Capture::Complete {
        stdout: stdout_buf,
        stderr: stderr_buf,
        status,
    })
}

/// Read a stream to the end, keeping at most `keep` bytes
async fn drain<R: AsyncRead + Unpin>(mut reader: R, keep: usize) -> io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(kept);
        }
        let room = keep.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
}

//! Tests for the tool executors

use super::subprocess::{ExecError, ExecutionLimits, SubprocessExecutor};
use super::*;
use std::path::PathBuf;
use std::time::Duration;

fn limits(max_output_bytes: usize, timeout_ms: u64) -> ExecutionLimits {
    ExecutionLimits {
        max_output_bytes,
        timeout: Some(Duration::from_millis(timeout_ms)),
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_execute_command_success() {
    let result = SubprocessExecutor::execute_command(
        Path::new("echo"),
        &args(&["hello"]),
        None,
        &limits(1024, 5000),
    )
    .await;

    let execution_result = result.unwrap();
    assert!(execution_result.success);
    assert_eq!(execution_result.exit_code, Some(0));
    assert!(execution_result.stdout.contains("hello"));
    assert!(execution_result.stderr.is_empty());
}

#[tokio::test]
async fn test_execute_command_failure() {
    let result =
        SubprocessExecutor::execute_command(Path::new("false"), &[], None, &limits(1024, 5000))
            .await;

    let execution_result = result.unwrap();
    assert!(!execution_result.success);
    assert_eq!(execution_result.exit_code, Some(1));
}

#[tokio::test]
async fn test_execute_command_timeout() {
    let result = SubprocessExecutor::execute_command(
        Path::new("sleep"),
        &args(&["10"]),
        None,
        &limits(1024, 500),
    )
    .await;

    assert!(matches!(result, Err(ExecError::Timeout(_))));
}

#[tokio::test]
async fn test_execute_command_output_limit_is_a_failure() {
    // 64 KiB of output against a 1 KiB cap
    let result = SubprocessExecutor::execute_command(
        Path::new("head"),
        &args(&["-c", "65536", "/dev/zero"]),
        None,
        &limits(1024, 5000),
    )
    .await;

    assert!(matches!(result, Err(ExecError::OutputLimit(1024))));
}

#[tokio::test]
async fn test_execute_command_output_at_limit_succeeds() {
    let result = SubprocessExecutor::execute_command(
        Path::new("head"),
        &args(&["-c", "1024", "/dev/zero"]),
        None,
        &limits(1024, 5000),
    )
    .await;

    let execution_result = result.unwrap();
    assert!(execution_result.success);
    assert_eq!(execution_result.stdout.len(), 1024);
}

#[tokio::test]
async fn test_run_agent_maps_exit_failure() {
    let dir = std::env::temp_dir();
    let result = ToolExecutors::run_agent(
        "nomos",
        Path::new("sh"),
        &dir,
        &args(&["-c", "echo 'disk read error' >&2; exit 1"]),
        &limits(1024, 5000),
    )
    .await;

    match result {
        Err(ToolError::Exit {
            tool,
            code,
            message,
        }) => {
            assert_eq!(tool, "nomos");
            assert_eq!(code, Some(1));
            assert_eq!(message, "disk read error");
        }
        other => panic!("expected exit failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_agent_maps_launch_failure() {
    let dir = std::env::temp_dir();
    let missing = PathBuf::from("/nonexistent/agent/binary_12345");
    let result = ToolExecutors::run_agent("monk", &missing, &dir, &[], &limits(1024, 5000)).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ToolError::Launch { .. }));
    assert_eq!(err.tool(), "monk");
}

#[tokio::test]
async fn test_run_agent_records_parameters() {
    let dir = std::env::temp_dir();
    let output = ToolExecutors::run_agent(
        "copyright",
        Path::new("echo"),
        &dir,
        &args(&["--files", "a.c", "-J"]),
        &limits(1024, 5000),
    )
    .await
    .unwrap();

    assert_eq!(output.parameters, "--files a.c -J");
    assert_eq!(output.stdout.trim(), "--files a.c -J");
}

#[test]
fn test_failure_message_fallbacks() {
    assert_eq!(failure_message("  boom \n", "out", Some(2)), "boom");
    assert_eq!(failure_message("", " out ", Some(2)), "out");
    assert_eq!(failure_message("", "", Some(2)), "exit status 2");
    assert_eq!(failure_message("", "", None), "terminated by signal");
}

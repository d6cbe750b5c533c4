//! Per-file batch runner
//!
//! Applies one per-file tool across an enumerated file list. A file whose run
//! fails or whose output does not parse is recorded and dropped. The batch
//! only fails when the tool binary cannot be started at all.

use odinscan_tools::{ToolError, ToolKind};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::document::{BatchResult, BatchSummary, ContentType, FileFailure, Payload, PerFileResult};

/// Outcome of running a tool on one file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Success(PerFileResult),
    Skipped { path: String, reason: String },
    Failed(FileFailure),
}

impl FileOutcome {
    /// Run `runner` on one file and classify the result
    ///
    /// A launch failure is returned as an error: it says nothing about the
    /// file and would repeat for every other one.
    async fn of<F, Fut>(tool: ToolKind, file: &Path, runner: &mut F) -> Result<Self, ToolError>
    where
        F: FnMut(PathBuf) -> Fut,
        Fut: Future<Output = Result<String, ToolError>>,
    {
        let path = file.to_string_lossy().into_owned();
        if path.is_empty() {
            return Ok(FileOutcome::Skipped {
                path,
                reason: "empty file entry".to_string(),
            });
        }

        let stdout = match runner(file.to_path_buf()).await {
            Ok(stdout) => stdout,
            Err(e @ ToolError::Launch { .. }) => return Err(e),
            Err(e) => {
                return Ok(FileOutcome::Failed(FileFailure {
                    path,
                    reason: e.to_string(),
                }))
            }
        };

        if stdout.trim().is_empty() {
            return Ok(FileOutcome::Skipped {
                path,
                reason: format!("{} produced no output", tool),
            });
        }

        Ok(match serde_json::from_str::<Value>(&stdout) {
            Ok(output) => FileOutcome::Success(PerFileResult { path, output }),
            Err(e) => FileOutcome::Failed(FileFailure {
                path,
                reason: format!("unparseable {} output: {}", tool, e),
            }),
        })
    }
}

/// Run a per-file tool over `files` in order
///
/// Only successful files appear in the output sequence. Skipped and failed
/// files are counted in the summary, and failures are listed with their reason.
/// Stops at the first [`ToolError::Launch`] and returns it.
pub async fn visit_files<F, Fut>(
    tool: ToolKind,
    version: &str,
    files: &[PathBuf],
    mut runner: F,
) -> Result<BatchResult, ToolError>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = Result<String, ToolError>>,
{
    let mut entries = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    let mut summary = BatchSummary::default();

    for file in files {
        match FileOutcome::of(tool, file, &mut runner).await? {
            FileOutcome::Success(entry) => {
                summary.succeeded += 1;
                entries.push(entry);
            }
            FileOutcome::Skipped { path, reason } => {
                debug!("Skipping {} for {}: {}", path, tool, reason);
                summary.skipped += 1;
            }
            FileOutcome::Failed(failure) => {
                warn!("{} failed on {}: {}", tool, failure.path, failure.reason);
                summary.failed += 1;
                failures.push(failure);
            }
        }
    }

    debug!(
        "{} batch done: {} succeeded, {} skipped, {} failed",
        tool, summary.succeeded, summary.skipped, summary.failed
    );

    Ok(BatchResult {
        version: version.to_string(),
        output: Payload {
            content_type: ContentType::Json,
            content: entries,
        },
        summary,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_one_failing_file_is_dropped() {
        let list = files(&["/u/1.c", "/u/2.c", "/u/3.c", "/u/4.c", "/u/5.c"]);

        let batch = visit_files(ToolKind::Copyright, "0.0.0", &list, |file| async move {
            if file.ends_with("3.c") {
                Err(ToolError::Exit {
                    tool: "copyright".to_string(),
                    code: Some(1),
                    message: "cannot open file".to_string(),
                })
            } else {
                Ok(format!("{{\"file\": \"{}\"}}", file.display()))
            }
        })
        .await
        .unwrap();

        assert_eq!(batch.entries().len(), 4);
        assert!(batch.entries().iter().all(|e| e.path != "/u/3.c"));
        assert_eq!(
            batch.summary,
            BatchSummary {
                succeeded: 4,
                skipped: 0,
                failed: 1
            }
        );
        assert_eq!(batch.failures[0].path, "/u/3.c");
        assert!(batch.failures[0].reason.contains("cannot open file"));
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let list = files(&["/u/b", "/u/a", "/u/c"]);
        let batch = visit_files(ToolKind::Monk, "3.4.0", &list, |_| async { Ok("{}".to_string()) })
            .await
            .unwrap();

        let paths: Vec<_> = batch.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/u/b", "/u/a", "/u/c"]);
        assert_eq!(batch.version, "3.4.0");
        assert_eq!(batch.output.content_type, ContentType::Json);
    }

    #[tokio::test]
    async fn test_malformed_output_counts_as_failure() {
        let list = files(&["/u/good", "/u/bad"]);
        let batch = visit_files(ToolKind::Monk, "3.4.0", &list, |file| async move {
            if file.ends_with("bad") {
                Ok("{not json".to_string())
            } else {
                Ok("{\"matches\": []}".to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(batch.entries().len(), 1);
        assert_eq!(batch.summary.failed, 1);
        assert!(batch.failures[0].reason.contains("unparseable monk output"));
    }

    #[tokio::test]
    async fn test_empty_entries_and_output_are_skipped() {
        let list = files(&["", "/u/silent", "/u/ok"]);
        let mut calls = 0;
        let batch = visit_files(ToolKind::Copyright, "0.0.0", &list, |file| {
            calls += 1;
            async move {
                if file.ends_with("silent") {
                    Ok("  \n".to_string())
                } else {
                    Ok("[]".to_string())
                }
            }
        })
        .await
        .unwrap();

        // The empty entry never reaches the runner
        assert_eq!(calls, 2);
        assert_eq!(batch.entries().len(), 1);
        assert_eq!(batch.summary.skipped, 2);
        assert!(batch.failures.is_empty());
    }

    #[tokio::test]
    async fn test_launch_failure_aborts_batch() {
        let list = files(&["/u/1.c", "/u/2.c", "/u/3.c"]);
        let mut calls = 0;
        let result = visit_files(ToolKind::Copyright, "0.0.0", &list, |_| {
            calls += 1;
            async {
                Err(ToolError::Launch {
                    tool: "copyright".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "bad interpreter"),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ToolError::Launch { .. })));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_empty_file_list() {
        let batch = visit_files(ToolKind::Monk, "3.4.0", &[], |_| async { Ok("{}".to_string()) })
            .await
            .unwrap();
        assert!(batch.entries().is_empty());
        assert_eq!(batch.summary, BatchSummary::default());
    }
}

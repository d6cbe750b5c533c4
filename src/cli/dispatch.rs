//! CLI command dispatch
//!
//! - scan: run the tool suite over a path and emit the document
//! - version: report the detected tool versions

use odinscan_tools::SUITE_NAME;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::{Args, Command, Result, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_SKIPPED, EXIT_SUCCESS};
use crate::config::ScanConfig;
use crate::scan::{ScanDocument, ScanOutcome, ScanProcessor, ScanUnit, SUITE_UNAVAILABLE};

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Run the parsed command and return the exit code
pub async fn run(args: Args) -> ExitCode {
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    match args.command {
        Command::Scan {
            path,
            kind,
            output,
            pretty,
        } => {
            let kind = kind.unwrap_or_else(|| config.request_type.clone());
            run_scan(&config, ScanUnit::new(kind, absolute(path)), output.as_deref(), pretty).await
        }
        Command::Version => run_version(&config).await,
    }
}

/// Configuration with the `--install-dir` flag applied last
pub fn resolve_config(args: &Args) -> anyhow::Result<ScanConfig> {
    let mut config = ScanConfig::load(args.config.as_deref())?;
    if let Some(install_dir) = &args.install_dir {
        config.install_dir = install_dir.clone();
    }
    debug!("Using agents under {}", config.install_dir.display());
    Ok(config)
}

async fn run_scan(config: &ScanConfig, unit: ScanUnit, output: Option<&Path>, pretty: bool) -> ExitCode {
    let processor = ScanProcessor::start(config);

    match processor.process(unit).await {
        ScanOutcome::Assembled(document) => match write_document(&document, output, pretty) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_FAILURE
            }
        },
        ScanOutcome::Skipped { reason } => {
            eprintln!("Skipped: {}", reason);
            EXIT_SKIPPED
        }
        ScanOutcome::Dead { category, reason } => {
            eprintln!("Failed [{}]: {}", category, reason);
            EXIT_FAILURE
        }
    }
}

async fn run_version(config: &ScanConfig) -> ExitCode {
    let processor = ScanProcessor::new(config);

    let Some(versions) = processor.versions().await else {
        eprintln!("{}", SUITE_UNAVAILABLE);
        return EXIT_SKIPPED;
    };

    let report = json!({
        "tool": SUITE_NAME,
        "requestType": processor.request_type(),
        "toolVersion": versions.version,
        "installDir": processor.manager().install_root(),
        "components": versions.components,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{}", text);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

fn write_document(document: &ScanDocument, output: Option<&Path>, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };

    match output {
        Some(path) => fs::write(path, text + "\n")?,
        None => println!("{}", text),
    }
    Ok(())
}

/// Absolute form of a scan path; left as given when it cannot be resolved
fn absolute(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_install_dir_flag_wins() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "install_dir = \"/from/file\"\n").unwrap();

        let args = Args::try_parse_from([
            "odinscan",
            "--config",
            config_path.to_str().unwrap(),
            "--install-dir",
            "/from/flag",
            "version",
        ])
        .unwrap();

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.install_dir, PathBuf::from("/from/flag"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "max_output_bytes = 0\n").unwrap();

        let args = Args::try_parse_from(["odinscan", "--config", config_path.to_str().unwrap(), "version"]).unwrap();
        assert!(resolve_config(&args).is_err());
    }

    #[tokio::test]
    async fn test_missing_config_file_exits_with_config_error() {
        let args = Args::try_parse_from(["odinscan", "--config", "/nonexistent/odinscan.toml", "version"]).unwrap();
        assert_eq!(run(args).await, EXIT_CONFIG_ERROR);
    }

    #[tokio::test]
    async fn test_version_with_missing_agents_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        let args = Args::try_parse_from([
            "odinscan",
            "--config",
            config_path.to_str().unwrap(),
            "--install-dir",
            temp_dir.path().to_str().unwrap(),
            "version",
        ])
        .unwrap();
        assert_eq!(run(args).await, EXIT_SKIPPED);
    }

    #[test]
    fn test_write_document_to_file() {
        use crate::scan::{ContentType, DocumentMetadata, Payload, TreeToolResult};

        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("doc.json");
        let document = ScanDocument {
            metadata: DocumentMetadata {
                kind: "fossology".to_string(),
                request_id: uuid::Uuid::new_v4(),
                tool: "fossology".to_string(),
                tool_version: "6.8.1".to_string(),
                processed_at: chrono::Utc::now(),
            },
            size_kb: 1,
            file_count: 1,
            nomos: TreeToolResult {
                version: "3.4.0".to_string(),
                parameters: "-ld .".to_string(),
                output: Payload {
                    content_type: ContentType::TextPlain,
                    content: "File a.c contains license(s) MIT".to_string(),
                },
            },
            copyright: None,
            monk: None,
        };

        write_document(&document, Some(&out), true).unwrap();
        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["nomos"]["parameters"], "-ld .");
        assert_eq!(written["_metadata"]["toolVersion"], "6.8.1");
        assert!(written.get("copyright").is_none());
    }
}

//! CLI argument parsing
//!
//! ```text
//! odinscan [options] scan <PATH> [--type <TYPE>] [--output <FILE>] [--pretty]
//! odinscan [options] version
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogConfig;

/// Parsed CLI arguments
#[derive(Debug, Clone, Parser)]
#[command(name = "odinscan", version, about = "Run the license and copyright scanning agents over a source tree")]
pub struct Args {
    /// Configuration file (defaults to $ODINSCAN_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Agent install root, overriding configuration and environment
    #[arg(long, global = true, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log to stderr as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also write logs to a daily file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Scan a directory or file and print the document
    Scan {
        /// Content to scan
        path: PathBuf,

        /// Request type tag
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// Write the document to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Pretty-print the document
        #[arg(long)]
        pretty: bool,
    },

    /// Print the detected tool versions
    Version,
}

impl Args {
    /// Logging options carried by the global flags
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            verbose: self.verbose,
            json: self.json_logs,
            log_dir: self.log_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        let args = Args::try_parse_from([
            "odinscan",
            "scan",
            "/src/pkg",
            "--type",
            "fossology",
            "--pretty",
            "--install-dir",
            "/opt/agents",
        ])
        .unwrap();

        assert_eq!(args.install_dir, Some(PathBuf::from("/opt/agents")));
        match args.command {
            Command::Scan {
                path,
                kind,
                output,
                pretty,
            } => {
                assert_eq!(path, PathBuf::from("/src/pkg"));
                assert_eq!(kind.as_deref(), Some("fossology"));
                assert!(output.is_none());
                assert!(pretty);
            }
            Command::Version => panic!("expected scan"),
        }
    }

    #[test]
    fn test_parse_version_with_global_flags() {
        let args = Args::try_parse_from(["odinscan", "--verbose", "--json-logs", "version"]).unwrap();
        assert!(matches!(args.command, Command::Version));

        let logs = args.log_config();
        assert!(logs.verbose);
        assert!(logs.json);
        assert!(logs.log_dir.is_none());
    }

    #[test]
    fn test_scan_requires_path() {
        assert!(Args::try_parse_from(["odinscan", "scan"]).is_err());
        assert!(Args::try_parse_from(["odinscan"]).is_err());
    }
}

//! Configuration Management Module
//!
//! Scanner configuration is read from a TOML file and then overridden by
//! `ODINSCAN_*` environment variables. Missing fields take their defaults, so
//! an empty file (or no file at all) yields a working configuration for a
//! standard install.

use anyhow::{anyhow, Context, Result};
use odinscan_tools::{ExecutionLimits, ToolKind, ToolSuite, DEFAULT_MAX_OUTPUT_BYTES, PATH_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "ODINSCAN_CONFIG";

const DEFAULT_INSTALL_DIR: &str = "/opt/fossology";
const DEFAULT_REQUEST_TYPE: &str = "fossology";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory holding one subdirectory per agent
    pub install_dir: PathBuf,
    /// Request type handled by the processor
    pub request_type: String,
    /// Stdout cap per tool invocation; exceeding it fails the invocation
    pub max_output_bytes: usize,
    /// Deadline per tool invocation in seconds; 0 disables it
    pub timeout_secs: u64,
    /// Run the tree tool and both per-file batches concurrently
    pub parallel_batches: bool,
    /// Agent conventions
    pub tools: ToolSuite,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            request_type: DEFAULT_REQUEST_TYPE.to_string(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            parallel_batches: false,
            tools: ToolSuite::default(),
        }
    }
}

impl ScanConfig {
    /// Resolve configuration the way the binary does
    ///
    /// An explicit path wins, then `$ODINSCAN_CONFIG`, then
    /// `<config_dir>/odinscan/config.toml` if it exists, then defaults.
    /// Environment overrides are applied on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(|| Self::default_path().filter(|p| p.exists())),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("odinscan").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))
    }

    /// Apply `ODINSCAN_*` overrides read through `lookup`
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(install_dir) = lookup("ODINSCAN_INSTALL_DIR") {
            self.install_dir = PathBuf::from(install_dir);
            debug!("Applied env override for install dir");
        }

        if let Some(value) = lookup("ODINSCAN_MAX_OUTPUT_BYTES") {
            match value.trim().parse::<usize>() {
                Ok(bytes) => {
                    self.max_output_bytes = bytes;
                    debug!("Applied env override for max output bytes");
                }
                Err(_) => warn!("Ignoring ODINSCAN_MAX_OUTPUT_BYTES={:?}: not a byte count", value),
            }
        }

        if let Some(value) = lookup("ODINSCAN_TIMEOUT_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) => {
                    self.timeout_secs = secs;
                    debug!("Applied env override for timeout");
                }
                Err(_) => warn!("Ignoring ODINSCAN_TIMEOUT_SECS={:?}: not a number of seconds", value),
            }
        }

        if let Some(value) = lookup("ODINSCAN_PARALLEL_BATCHES") {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.parallel_batches = true,
                "0" | "false" | "no" => self.parallel_batches = false,
                _ => warn!("Ignoring ODINSCAN_PARALLEL_BATCHES={:?}: not a boolean", value),
            }
        }
    }

    /// Reject configurations the processor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_output_bytes == 0 {
            return Err(anyhow!("max_output_bytes must be greater than zero"));
        }
        if self.request_type.trim().is_empty() {
            return Err(anyhow!("request_type must not be empty"));
        }
        if !self.tools.nomos.enabled {
            return Err(anyhow!("The nomos tool cannot be disabled: every document needs its result"));
        }
        for kind in ToolKind::ALL {
            let spec = self.tools.get(kind);
            if spec.binary.trim().is_empty() {
                return Err(anyhow!("No binary configured for {}", kind));
            }
            if !spec.scan_args.iter().any(|arg| arg.contains(PATH_PLACEHOLDER)) {
                return Err(anyhow!(
                    "Scan arguments for {} must contain the {} placeholder",
                    kind,
                    PATH_PLACEHOLDER
                ));
            }
        }
        Ok(())
    }

    /// Limits applied to every tool invocation
    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_output_bytes: self.max_output_bytes,
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }
}

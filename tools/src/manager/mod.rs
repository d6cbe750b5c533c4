//! Tools Manager Module
//!
//! The tool manager is the single gateway to the installed agents. It knows
//! the install layout and the invocation conventions of every tool in the
//! suite, and is shared read-only by every scan request.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, ToolError};
use crate::tool_models::{RawOutput, ToolKind, ToolSpec, ToolSuite, ToolVersion, VersionOrigin, VersionSource};
use crate::version::normalize_version;

pub mod executors;

use crate::manager::executors::subprocess::ExecutionLimits;
use crate::manager::executors::ToolExecutors;

/// Gateway to the agents found under one install root
#[derive(Debug, Clone)]
pub struct ToolManager {
    install_root: PathBuf,
    suite: ToolSuite,
    limits: ExecutionLimits,
}

impl ToolManager {
    /// Create a tool manager for an install root
    pub fn new(install_root: impl Into<PathBuf>, suite: ToolSuite, limits: ExecutionLimits) -> Self {
        Self {
            install_root: install_root.into(),
            suite,
            limits,
        }
    }

    /// The install root shared by every tool
    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// The configured tool suite
    pub fn suite(&self) -> &ToolSuite {
        &self.suite
    }

    /// Spec of one tool
    pub fn spec(&self, kind: ToolKind) -> &ToolSpec {
        self.suite.get(kind)
    }

    /// Directory the tool runs in
    pub fn agent_dir(&self, kind: ToolKind) -> PathBuf {
        self.install_root.join(&self.spec(kind).agent_dir)
    }

    /// Full path of the tool executable
    pub fn binary_path(&self, kind: ToolKind) -> PathBuf {
        self.agent_dir(kind).join(&self.spec(kind).binary)
    }

    /// Invoke a tool with a fixed argument vector
    pub async fn invoke(&self, kind: ToolKind, args: &[String]) -> Result<RawOutput> {
        let program = self.binary_path(kind);
        let agent_dir = self.agent_dir(kind);
        ToolExecutors::run_agent(kind.name(), &program, &agent_dir, args, &self.limits).await
    }

    /// Run the tool's scan invocation against a target path
    pub async fn scan(&self, kind: ToolKind, target: &Path) -> Result<RawOutput> {
        let args = self.spec(kind).scan_args_for(target);
        self.invoke(kind, &args).await
    }

    /// Check that the tool binary exists and can be executed
    pub fn ensure_launchable(&self, kind: ToolKind) -> Result<()> {
        let program = self.binary_path(kind);
        let launch_error = |message: String| ToolError::Launch {
            tool: kind.name().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
        };

        let metadata = std::fs::metadata(&program)
            .map_err(|e| launch_error(format!("{}: {}", program.display(), e)))?;
        if !metadata.is_file() {
            return Err(launch_error(format!("{} is not a file", program.display())));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(launch_error(format!("{} is not executable", program.display())));
            }
        }

        Ok(())
    }

    /// Detect the version of one tool
    pub async fn query_version(&self, kind: ToolKind) -> Result<ToolVersion> {
        let (version, origin) = match &self.spec(kind).version {
            VersionSource::Fixed { version } => {
                debug!("Using fixed version {} for {}", version, kind);
                (version.clone(), VersionOrigin::Fixed)
            }
            VersionSource::Query { args, label } => {
                let output = self.invoke(kind, args).await?;
                let version = normalize_version(&output.stdout, label).ok_or_else(|| {
                    ToolError::VersionFormat {
                        tool: kind.name().to_string(),
                        raw: output.stdout.clone(),
                    }
                })?;
                (version, VersionOrigin::Query { raw: output.stdout })
            }
        };

        info!("Detected {} version {}", kind, version);
        Ok(ToolVersion {
            tool: kind,
            version,
            origin,
        })
    }
}

//! Tool Suite Models
//!
//! This module defines the data structures describing the scanning agents,
//! how they are installed and how their versions are discovered.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name the suite reports as its tool, whatever request type it serves
pub const SUITE_NAME: &str = "fossology";

/// Placeholder replaced by the scan target in scan argument vectors
pub const PATH_PLACEHOLDER: &str = "{path}";

/// The scanning agents driven by the orchestrator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// License fingerprinting, run once against the whole tree
    Nomos,
    /// Copyright statement extraction, run per file
    Copyright,
    /// License text matching, run per file
    Monk,
}

impl ToolKind {
    /// Every tool in suite order
    pub const ALL: [ToolKind; 3] = [ToolKind::Nomos, ToolKind::Copyright, ToolKind::Monk];

    /// Name used in logs, errors and document keys
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Nomos => "nomos",
            ToolKind::Copyright => "copyright",
            ToolKind::Monk => "monk",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a tool's version comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VersionSource {
    /// Run the tool with `args` and strip `label` from its stdout
    Query { args: Vec<String>, label: String },
    /// The tool has no discoverable version; use a constant
    Fixed { version: String },
}

/// Installation and invocation conventions for one tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSpec {
    /// Agent directory relative to the install root
    pub agent_dir: PathBuf,
    /// Executable inside the agent directory
    pub binary: String,
    /// Scan arguments; `{path}` is replaced by the scan target
    pub scan_args: Vec<String>,
    /// Version discovery convention
    pub version: VersionSource,
    /// Disabled tools are skipped entirely
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ToolSpec {
    /// Expand the scan argument vector for a target path
    pub fn scan_args_for(&self, target: &Path) -> Vec<String> {
        let target = target.to_string_lossy();
        self.scan_args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &target))
            .collect()
    }

    fn query(agent_dir: &str, binary: &str, scan_args: &[&str], label: &str) -> Self {
        Self {
            agent_dir: PathBuf::from(agent_dir),
            binary: binary.to_string(),
            scan_args: scan_args.iter().map(|s| s.to_string()).collect(),
            version: VersionSource::Query {
                args: vec!["-V".to_string()],
                label: label.to_string(),
            },
            enabled: true,
        }
    }
}

/// Specs for the whole suite, one per [`ToolKind`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolSuite {
    pub nomos: ToolSpec,
    pub copyright: ToolSpec,
    pub monk: ToolSpec,
}

impl Default for ToolSuite {
    fn default() -> Self {
        Self {
            nomos: ToolSpec::query("nomos/agent", "nomossa", &["-ld", "{path}"], "nomos build version:"),
            // The copyright agent cannot report a version; it is built from the
            // same tree as nomos, so it contributes a constant.
            copyright: ToolSpec {
                agent_dir: PathBuf::from("copyright/agent"),
                binary: "copyright".to_string(),
                scan_args: vec!["--files".to_string(), "{path}".to_string(), "-J".to_string()],
                version: VersionSource::Fixed {
                    version: "0.0.0".to_string(),
                },
                enabled: true,
            },
            monk: ToolSpec::query("monk/agent", "monk", &["-J", "{path}"], "monk version"),
        }
    }
}

impl ToolSuite {
    /// Spec for a tool
    pub fn get(&self, kind: ToolKind) -> &ToolSpec {
        match kind {
            ToolKind::Nomos => &self.nomos,
            ToolKind::Copyright => &self.copyright,
            ToolKind::Monk => &self.monk,
        }
    }

    /// Mutable spec for a tool
    pub fn get_mut(&mut self, kind: ToolKind) -> &mut ToolSpec {
        match kind {
            ToolKind::Nomos => &mut self.nomos,
            ToolKind::Copyright => &mut self.copyright,
            ToolKind::Monk => &mut self.monk,
        }
    }

    /// Enabled tools in suite order
    pub fn enabled(&self) -> impl Iterator<Item = ToolKind> + '_ {
        ToolKind::ALL
            .into_iter()
            .filter(move |kind| self.get(*kind).enabled)
    }
}

/// How a tool version was obtained
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum VersionOrigin {
    /// Parsed from the raw output of the version query
    Query { raw: String },
    /// Configured constant
    Fixed,
}

/// Normalized version of one tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolVersion {
    pub tool: ToolKind,
    pub version: String,
    #[serde(flatten)]
    pub origin: VersionOrigin,
}

/// Captured output of a successful invocation
#[derive(Debug, Clone)]
pub struct RawOutput {
    /// Standard output, lossily decoded as UTF-8
    pub stdout: String,
    /// The exact argument string the tool was run with
    pub parameters: String,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_args_expansion() {
        let suite = ToolSuite::default();
        let args = suite.nomos.scan_args_for(Path::new("/scan/unit"));
        assert_eq!(args, vec!["-ld".to_string(), "/scan/unit".to_string()]);

        let args = suite.copyright.scan_args_for(Path::new("/scan/unit/a.c"));
        assert_eq!(args, vec!["--files", "/scan/unit/a.c", "-J"]);
    }

    #[test]
    fn test_enabled_preserves_suite_order() {
        let mut suite = ToolSuite::default();
        assert_eq!(
            suite.enabled().collect::<Vec<_>>(),
            vec![ToolKind::Nomos, ToolKind::Copyright, ToolKind::Monk]
        );

        suite.get_mut(ToolKind::Copyright).enabled = false;
        assert_eq!(
            suite.enabled().collect::<Vec<_>>(),
            vec![ToolKind::Nomos, ToolKind::Monk]
        );
    }

    #[test]
    fn test_version_source_serialization() {
        let fixed = VersionSource::Fixed {
            version: "0.0.0".to_string(),
        };
        let json = serde_json::to_value(&fixed).unwrap();
        assert_eq!(json["source"], "fixed");
        assert_eq!(json["version"], "0.0.0");
    }
}

//! Composite tool version
//!
//! The suite version is derived from the versions of the individual agents:
//! every `major.minor.patch` position is summed across tools on top of a base
//! version. Agent versions only ever move forward, so any bump in any tool
//! moves the composite forward too. We do not care which tool changed, only
//! that something did.
//!
//! Detection runs once per [`VersionResolver`]. Concurrent callers share the
//! same in-flight detection, and a failed detection is remembered: the suite
//! stays unusable until the process restarts.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Result, ToolError};
use crate::manager::ToolManager;
use crate::tool_models::{ToolKind, ToolVersion};

/// Base version; bump it when the way the agents are run or configured changes
pub const BASE_VERSION: &str = "0.0.0";

/// Normalize raw version-query output
///
/// Strips the first occurrence of `label`, trims, and drops any
/// pre-release/build suffix after the first `-`. Returns `None` unless the
/// remainder is a plain `major.minor.patch`.
pub fn normalize_version(raw: &str, label: &str) -> Option<String> {
    let unlabeled = if label.is_empty() {
        raw.to_string()
    } else {
        raw.replacen(label, "", 1)
    };
    let trimmed = unlabeled.trim();
    let core = trimmed.split('-').next().unwrap_or_default().trim();
    parse_version(core).map(|_| core.to_string())
}

/// Parse a strict `major.minor.patch` version
pub fn parse_version(version: &str) -> Option<[u64; 3]> {
    let mut parts = [0u64; 3];
    let mut count = 0;
    for part in version.split('.') {
        if count == 3 || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts[count] = part.parse().ok()?;
        count += 1;
    }
    (count == 3).then_some(parts)
}

/// Sum versions position-wise on top of `base`
pub fn aggregate_versions(base: &str, versions: &[&ToolVersion]) -> Result<String> {
    let mut total = parse_version(base).ok_or_else(|| ToolError::VersionFormat {
        tool: "base".to_string(),
        raw: base.to_string(),
    })?;

    for tool_version in versions {
        let parts = parse_version(&tool_version.version).ok_or_else(|| ToolError::VersionFormat {
            tool: tool_version.tool.name().to_string(),
            raw: tool_version.version.clone(),
        })?;
        for (sum, part) in total.iter_mut().zip(parts) {
            *sum = sum.checked_add(part).ok_or_else(|| ToolError::VersionFormat {
                tool: tool_version.tool.name().to_string(),
                raw: tool_version.version.clone(),
            })?;
        }
    }

    Ok(format!("{}.{}.{}", total[0], total[1], total[2]))
}

/// The combined version of the whole suite
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeVersion {
    /// Composite `major.minor.patch`
    pub version: String,
    /// Versions of the tools it was built from, in suite order
    pub components: Vec<ToolVersion>,
}

impl CompositeVersion {
    /// Build the composite from detected tool versions
    pub fn from_components(base: &str, components: Vec<ToolVersion>) -> Result<Self> {
        let refs: Vec<&ToolVersion> = components.iter().collect();
        let version = aggregate_versions(base, &refs)?;
        Ok(Self {
            version,
            components,
        })
    }

    /// Version of one tool, if it took part in the composite
    pub fn component(&self, kind: ToolKind) -> Option<&ToolVersion> {
        self.components.iter().find(|c| c.tool == kind)
    }

    /// Numeric form, ordered like semantic versions
    pub fn semver(&self) -> [u64; 3] {
        parse_version(&self.version).unwrap_or_default()
    }
}

/// Single-flight resolver for the composite version
pub struct VersionResolver {
    manager: Arc<ToolManager>,
    base: String,
    resolved: OnceCell<Option<Arc<CompositeVersion>>>,
}

impl VersionResolver {
    /// Create a resolver with the default base version
    pub fn new(manager: Arc<ToolManager>) -> Self {
        Self::with_base(manager, BASE_VERSION)
    }

    /// Create a resolver with a custom base version
    pub fn with_base(manager: Arc<ToolManager>, base: impl Into<String>) -> Self {
        Self {
            manager,
            base: base.into(),
            resolved: OnceCell::new(),
        }
    }

    /// Resolve the composite version, detecting it on first use
    ///
    /// Returns `None` when detection failed; that answer is final.
    pub async fn resolve(&self) -> Option<Arc<CompositeVersion>> {
        self.resolved
            .get_or_init(|| self.detect())
            .await
            .clone()
    }

    /// Start detection in the background so the first request does not pay for it
    pub fn warm(self: &Arc<Self>) -> JoinHandle<()> {
        let resolver = Arc::clone(self);
        tokio::spawn(async move {
            resolver.resolve().await;
        })
    }

    /// Outcome of detection if it has completed
    pub fn peek(&self) -> Option<Option<Arc<CompositeVersion>>> {
        self.resolved.get().cloned()
    }

    async fn detect(&self) -> Option<Arc<CompositeVersion>> {
        match self.try_detect().await {
            Ok(composite) => {
                info!("Scanning tool suite version {}", composite.version);
                Some(Arc::new(composite))
            }
            Err(e) => {
                error!("Could not find scanning tool suite version: {}", e);
                None
            }
        }
    }

    async fn try_detect(&self) -> Result<CompositeVersion> {
        let mut components = Vec::new();
        for kind in self.manager.suite().enabled() {
            components.push(self.manager.query_version(kind).await?);
        }
        CompositeVersion::from_components(&self.base, components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_models::VersionOrigin;

    fn tool_version(tool: ToolKind, version: &str) -> ToolVersion {
        ToolVersion {
            tool,
            version: version.to_string(),
            origin: VersionOrigin::Fixed,
        }
    }

    fn composite(versions: &[(ToolKind, &str)]) -> CompositeVersion {
        let components = versions
            .iter()
            .map(|(tool, version)| tool_version(*tool, version))
            .collect();
        CompositeVersion::from_components(BASE_VERSION, components).unwrap()
    }

    #[test]
    fn test_normalize_strips_label_and_suffix() {
        assert_eq!(
            normalize_version("nomos build version: 3.4.0-12-g1a2b3c\n", "nomos build version:"),
            Some("3.4.0".to_string())
        );
        assert_eq!(
            normalize_version("monk version 3.4.0-rc1", "monk version"),
            Some("3.4.0".to_string())
        );
        assert_eq!(normalize_version("  1.2.3  ", ""), Some("1.2.3".to_string()));
    }

    #[test]
    fn test_normalize_rejects_unparseable_output() {
        assert_eq!(normalize_version("monk version unknown", "monk version"), None);
        assert_eq!(normalize_version("", "monk version"), None);
        assert_eq!(normalize_version("1.2", ""), None);
        assert_eq!(normalize_version("1.2.3.4", ""), None);
        assert_eq!(normalize_version("1.x.3", ""), None);
    }

    #[test]
    fn test_aggregate_sums_positions() {
        let version = composite(&[
            (ToolKind::Nomos, "3.4.0"),
            (ToolKind::Copyright, "0.0.0"),
            (ToolKind::Monk, "3.4.1"),
        ]);
        assert_eq!(version.version, "6.8.1");
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let a = composite(&[(ToolKind::Nomos, "1.2.3"), (ToolKind::Monk, "4.5.6")]);
        let b = composite(&[(ToolKind::Monk, "4.5.6"), (ToolKind::Nomos, "1.2.3")]);
        assert_eq!(a.version, b.version);
    }

    #[test]
    fn test_single_bump_increases_composite() {
        let before = composite(&[(ToolKind::Nomos, "1.2.3"), (ToolKind::Monk, "2.0.0")]);
        let patch = composite(&[(ToolKind::Nomos, "1.2.4"), (ToolKind::Monk, "2.0.0")]);
        let minor = composite(&[(ToolKind::Nomos, "1.3.0"), (ToolKind::Monk, "2.0.0")]);
        let major = composite(&[(ToolKind::Nomos, "1.2.3"), (ToolKind::Monk, "3.0.0")]);

        assert_ne!(before.version, patch.version);
        assert!(patch.semver() > before.semver());
        assert!(minor.semver() > before.semver());
        assert!(major.semver() > before.semver());
    }

    #[test]
    fn test_aggregate_rejects_misformatted_component() {
        let components = vec![tool_version(ToolKind::Monk, "3.4")];
        let err = CompositeVersion::from_components(BASE_VERSION, components).unwrap_err();
        assert_eq!(err.tool(), "monk");
    }

    #[test]
    fn test_aggregate_rejects_overflowing_component() {
        let components = vec![
            tool_version(ToolKind::Nomos, "1.0.0"),
            tool_version(ToolKind::Monk, &format!("{}.0.0", u64::MAX)),
        ];
        let err = CompositeVersion::from_components(BASE_VERSION, components).unwrap_err();
        assert!(matches!(err, ToolError::VersionFormat { .. }));
        assert_eq!(err.tool(), "monk");
    }

    #[test]
    fn test_component_lookup() {
        let version = composite(&[(ToolKind::Nomos, "3.4.0"), (ToolKind::Copyright, "0.0.0")]);
        assert_eq!(version.component(ToolKind::Nomos).unwrap().version, "3.4.0");
        assert!(version.component(ToolKind::Monk).is_none());
    }
}

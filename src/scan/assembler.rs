//! Document assembly
//!
//! enumerate → {tree tool, copyright batch, monk batch} → document
//!
//! The tree tool is load-bearing: if it fails there is no document. Per-file
//! batches absorb individual file failures, but a batch whose binary cannot
//! be launched at all is fatal too.

use chrono::Utc;
use odinscan_tools::{CompositeVersion, ToolKind, ToolManager, SUITE_NAME};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::document::{BatchResult, ContentType, DocumentMetadata, Payload, RootPrefix, ScanDocument, TreeToolResult};
use super::request::{ScanRequest, ScanState};
use super::visitor::visit_files;
use super::ScanError;
use crate::stats_tools::{list_files, SizeStats};

/// Builds scan documents by running the tool suite against a unit
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    manager: Arc<ToolManager>,
    parallel_batches: bool,
}

impl DocumentAssembler {
    pub fn new(manager: Arc<ToolManager>, parallel_batches: bool) -> Self {
        Self {
            manager,
            parallel_batches,
        }
    }

    /// Run every enabled tool against the request's unit and assemble the document
    ///
    /// Expects the request in the SIZED state; leaves it in TREE_TOOL_RUN on
    /// success. The caller records the terminal state.
    pub async fn assemble(
        &self,
        request: &mut ScanRequest,
        versions: &CompositeVersion,
        size: SizeStats,
    ) -> Result<ScanDocument, ScanError> {
        let root = request.unit.location.clone();
        let files = enumerate(&root).await?;
        debug!("{}: {} files to visit", request.unit, files.len());

        let (nomos, copyright, monk) = if self.parallel_batches {
            tokio::try_join!(
                self.run_tree_tool(&root, versions),
                self.run_batch(ToolKind::Copyright, versions, &files),
                self.run_batch(ToolKind::Monk, versions, &files),
            )?
        } else {
            let nomos = self.run_tree_tool(&root, versions).await?;
            request.advance(ScanState::TreeToolRun);
            let copyright = self.run_batch(ToolKind::Copyright, versions, &files).await?;
            let monk = self.run_batch(ToolKind::Monk, versions, &files).await?;
            (nomos, copyright, monk)
        };
        if request.state() == ScanState::Sized {
            request.advance(ScanState::TreeToolRun);
        }

        let prefix = RootPrefix::new(&root);
        let document = ScanDocument {
            metadata: DocumentMetadata {
                kind: request.unit.kind.clone(),
                request_id: request.unit.id,
                tool: SUITE_NAME.to_string(),
                tool_version: versions.version.clone(),
                processed_at: Utc::now(),
            },
            size_kb: size.size_kb,
            file_count: size.file_count,
            nomos: TreeToolResult {
                version: nomos.version,
                parameters: prefix.strip_text(&nomos.parameters),
                output: Payload {
                    content_type: ContentType::TextPlain,
                    content: prefix.strip_text(&nomos.output.content),
                },
            },
            copyright: copyright.map(|batch| stripped(batch, &prefix)),
            monk: monk.map(|batch| stripped(batch, &prefix)),
        };

        info!(
            "Assembled {} with tools [{}]",
            request.unit,
            document.tool_keys().join(", ")
        );
        Ok(document)
    }

    async fn run_tree_tool(&self, root: &Path, versions: &CompositeVersion) -> Result<TreeToolResult, ScanError> {
        let raw = self.manager.scan(ToolKind::Nomos, root).await?;
        debug!("nomos finished in {}ms", raw.duration_ms);
        Ok(TreeToolResult {
            version: component_version(versions, ToolKind::Nomos),
            parameters: raw.parameters,
            output: Payload {
                content_type: ContentType::TextPlain,
                content: raw.stdout,
            },
        })
    }

    /// Run a per-file tool; `None` when the tool is disabled
    async fn run_batch(
        &self,
        kind: ToolKind,
        versions: &CompositeVersion,
        files: &[PathBuf],
    ) -> Result<Option<BatchResult>, ScanError> {
        if !self.manager.spec(kind).enabled {
            debug!("{} disabled, leaving it out of the document", kind);
            return Ok(None);
        }
        self.manager.ensure_launchable(kind)?;

        let manager = &self.manager;
        let batch = visit_files(kind, &component_version(versions, kind), files, |file| async move {
            manager.scan(kind, &file).await.map(|raw| raw.stdout)
        })
        .await?;
        Ok(Some(batch))
    }
}

async fn enumerate(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let root = root.to_path_buf();
    let files = tokio::task::spawn_blocking(move || list_files(&root)).await??;
    Ok(files)
}

fn component_version(versions: &CompositeVersion, kind: ToolKind) -> String {
    versions
        .component(kind)
        .map(|component| component.version.clone())
        .unwrap_or_default()
}

fn stripped(mut batch: BatchResult, prefix: &RootPrefix) -> BatchResult {
    batch.strip_root(prefix);
    batch
}

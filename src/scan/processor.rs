//! Scan processor
//!
//! Entry point for scan requests. The composite suite version gates every
//! request: while it is unavailable, requests are skipped instead of
//! attempted.

use async_trait::async_trait;
use odinscan_tools::{CompositeVersion, ToolManager, VersionResolver};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::assembler::DocumentAssembler;
use super::request::{ScanOutcome, ScanRequest, ScanState, ScanUnit};
use super::ScanError;
use crate::config::ScanConfig;
use crate::stats_tools::compute_size;

/// Skip reason used while the tool suite is unusable
pub const SUITE_UNAVAILABLE: &str =
    "Scanning tool suite unavailable: version detection failed at startup. See startup log.";

/// Something that can drive a scan request to a terminal state
#[async_trait]
pub trait ScanHandler: Send + Sync {
    /// Whether this handler accepts the unit's request type
    fn can_handle(&self, unit: &ScanUnit) -> bool;

    /// Process a request in the RECEIVED state
    async fn handle(&self, request: &mut ScanRequest) -> ScanOutcome;
}

/// Runs the configured tool suite against scan units
pub struct ScanProcessor {
    request_type: String,
    manager: Arc<ToolManager>,
    resolver: Arc<VersionResolver>,
    assembler: DocumentAssembler,
}

impl ScanProcessor {
    /// Build a processor from configuration; version detection starts on first use
    pub fn new(config: &ScanConfig) -> Self {
        let manager = Arc::new(ToolManager::new(
            config.install_dir.clone(),
            config.tools.clone(),
            config.limits(),
        ));
        let resolver = Arc::new(VersionResolver::new(Arc::clone(&manager)));
        let assembler = DocumentAssembler::new(Arc::clone(&manager), config.parallel_batches);

        Self {
            request_type: config.request_type.clone(),
            manager,
            resolver,
            assembler,
        }
    }

    /// Build a processor and start version detection in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &ScanConfig) -> Self {
        let processor = Self::new(config);
        processor.resolver.warm();
        processor
    }

    pub fn manager(&self) -> &ToolManager {
        &self.manager
    }

    /// Request type this processor accepts
    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    /// Composite suite version; `None` while the suite is unusable
    pub async fn versions(&self) -> Option<Arc<CompositeVersion>> {
        self.resolver.resolve().await
    }

    /// Process one unit to a terminal outcome
    pub async fn process(&self, unit: ScanUnit) -> ScanOutcome {
        let mut request = ScanRequest::new(unit);
        if !self.can_handle(&request.unit) {
            let reason = format!(
                "Unsupported request type '{}', expected '{}'",
                request.unit.kind, self.request_type
            );
            warn!("Skipping {}: {}", request.unit, reason);
            return request.mark_skip(reason);
        }
        self.handle(&mut request).await
    }

    fn fail(request: &mut ScanRequest, err: ScanError) -> ScanOutcome {
        error!("{} failed [{}]: {}", request.unit, err.category(), err);
        request.mark_dead(err.category(), err.to_string())
    }
}

#[async_trait]
impl ScanHandler for ScanProcessor {
    fn can_handle(&self, unit: &ScanUnit) -> bool {
        unit.kind == self.request_type
    }

    async fn handle(&self, request: &mut ScanRequest) -> ScanOutcome {
        let Some(versions) = self.resolver.resolve().await else {
            warn!("Skipping {}: {}", request.unit, SUITE_UNAVAILABLE);
            return request.mark_skip(SUITE_UNAVAILABLE);
        };

        let root = request.unit.location.clone();
        let size = match tokio::task::spawn_blocking(move || compute_size(&root)).await {
            Ok(Ok(size)) => size,
            Ok(Err(e)) => return Self::fail(request, e.into()),
            Err(e) => return Self::fail(request, e.into()),
        };
        request.advance(ScanState::Sized);

        match self.assembler.assemble(request, &versions, size).await {
            Ok(document) => {
                request.advance(ScanState::Assembled);
                info!(
                    "{} assembled: {} files, {} KB",
                    request.unit, document.file_count, document.size_kb
                );
                ScanOutcome::Assembled(Box::new(document))
            }
            Err(e) => Self::fail(request, e),
        }
    }
}

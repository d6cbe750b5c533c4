//! Scan orchestration
//!
//! Drives the tool suite for one scan unit at a time: version gate, sizing,
//! tool runs and document assembly.

pub mod assembler;
pub mod document;
pub mod processor;
pub mod request;
pub mod visitor;

use odinscan_tools::ToolError;
use thiserror::Error;

use crate::stats_tools::StatsError;

pub use assembler::DocumentAssembler;
pub use document::{
    BatchResult, BatchSummary, ContentType, DocumentMetadata, FileFailure, Payload, PerFileResult, RootPrefix,
    ScanDocument, TreeToolResult,
};
pub use processor::{ScanHandler, ScanProcessor, SUITE_UNAVAILABLE};
pub use request::{ScanOutcome, ScanRequest, ScanState, ScanUnit};
pub use visitor::{visit_files, FileOutcome};

/// Fatal errors while processing a scan request
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("Background task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for ScanError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScanError::Join(err.to_string())
    }
}

impl ScanError {
    /// Short failure category reported with a dead request
    pub fn category(&self) -> &'static str {
        match self {
            ScanError::Tool(_) => "ToolExec",
            ScanError::Stats(_) => "Filesystem",
            ScanError::Join(_) => "Internal",
        }
    }
}

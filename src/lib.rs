//! OdinScan: multi-tool scanning orchestrator
//!
//! Drives the nomos, copyright and monk agents over one scan unit, derives a
//! composite suite version from theirs, and assembles their results into a
//! single document that only contains paths relative to the scanned unit.

pub mod cli;
pub mod config;
pub mod logging;
pub mod scan;
pub mod stats_tools;

pub use config::ScanConfig;
pub use scan::{ScanDocument, ScanOutcome, ScanProcessor, ScanRequest, ScanState, ScanUnit};
pub use stats_tools::{compute_size, list_files, SizeStats};

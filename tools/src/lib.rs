//! OdinScan Tools Module
//!
//! Invocation gateway and version detection for the external scanning
//! agents (nomos, copyright, monk). The agents do the actual analysis; this
//! crate only knows how to run them, bound their output and tell which
//! versions are installed.

pub mod error;
pub mod manager;
pub mod tool_models;
pub mod version;

pub use error::{Result, ToolError};
pub use manager::executors::subprocess::{ExecutionLimits, DEFAULT_MAX_OUTPUT_BYTES};
pub use manager::ToolManager;
pub use tool_models::*;
pub use version::{CompositeVersion, VersionResolver, BASE_VERSION};

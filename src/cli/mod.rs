//! CLI module
//!
//! Provides:
//! - Argument parsing (clap)
//! - Configuration resolution (flag → env → config dir → defaults)
//! - Command dispatch with deterministic exit codes

pub mod args;
pub mod dispatch;

// Re-exports
pub use args::{Args, Command};
pub use dispatch::{run, ExitCode};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;
pub const EXIT_SKIPPED: i32 = 3;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

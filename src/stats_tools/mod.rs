//! Stats tools — descriptive metadata about a scan unit
//!
//! Pure, deterministic filesystem walks. No shell invocation, Rust stdlib
//! only. Version-control metadata is never counted nor enumerated.

mod fs_stats;
mod list_files;

use std::path::Path;
use thiserror::Error;

pub use fs_stats::{compute_size, SizeStats};
pub use list_files::list_files;

/// Directory names holding version-control metadata
pub const VCS_METADATA_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

/// Errors from the filesystem walks
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Path does not exist: {0}")]
    NotFound(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for stats operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// True if the entry is version-control metadata and must be skipped with its subtree
pub fn is_vcs_metadata(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| VCS_METADATA_DIRS.contains(&name))
        .unwrap_or(false)
}

fn io_error(path: &Path, source: std::io::Error) -> StatsError {
    StatsError::Io {
        path: path.display().to_string(),
        source,
    }
}

//! compute_size — Scan unit size metadata
//!
//! Returns:
//! - sizeKB: Total size of regular files in whole kilobytes (rounded)
//! - fileCount: Number of regular files
//!
//! Version-control metadata directories are pruned together with their
//! subtree; their siblings are still visited.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{io_error, is_vcs_metadata, Result, StatsError};

/// Size metadata attached to a scan document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeStats {
    /// Total size in whole kilobytes, rounded half up
    #[serde(rename = "sizeKB")]
    pub size_kb: u64,
    /// Number of regular files
    #[serde(rename = "fileCount")]
    pub file_count: usize,
    /// Total size in bytes
    #[serde(skip)]
    pub total_bytes: u64,
}

impl SizeStats {
    fn from_totals(total_bytes: u64, file_count: usize) -> Self {
        Self {
            size_kb: (total_bytes + 512) / 1024,
            file_count,
            total_bytes,
        }
    }
}

/// Compute size metadata for a directory tree
///
/// A plain file as root counts as a single file.
pub fn compute_size(root: &Path) -> Result<SizeStats> {
    let metadata = match fs::symlink_metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StatsError::NotFound(root.display().to_string()))
        }
        Err(e) => return Err(io_error(root, e)),
    };

    if metadata.is_file() {
        return Ok(SizeStats::from_totals(metadata.len(), 1));
    }

    let mut total_bytes = 0;
    let mut file_count = 0;
    walk_dir(root, &mut total_bytes, &mut file_count)?;

    Ok(SizeStats::from_totals(total_bytes, file_count))
}

/// Walk directory tree recursively
fn walk_dir(path: &Path, total_bytes: &mut u64, file_count: &mut usize) -> Result<()> {
    let entries = fs::read_dir(path).map_err(|e| io_error(path, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| io_error(path, e))?;
        let entry_path = entry.path();

        if is_vcs_metadata(&entry_path) {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| io_error(&entry_path, e))?;

        if file_type.is_file() {
            let metadata = entry.metadata().map_err(|e| io_error(&entry_path, e))?;
            *total_bytes += metadata.len();
            *file_count += 1;
        } else if file_type.is_dir() {
            walk_dir(&entry_path, total_bytes, file_count)?;
        }
    }

    Ok(())
}

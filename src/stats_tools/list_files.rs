//! list_files — Enumerate the regular files of a scan unit
//!
//! Returns absolute (root-joined) paths in sorted order so per-file batches
//! are deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use super::{io_error, is_vcs_metadata, Result, StatsError};

/// List every regular file under `root`, skipping version-control metadata
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(StatsError::NotFound(root.display().to_string()));
    }

    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    collect(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();

        if is_vcs_metadata(&path) {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;
        if file_type.is_file() {
            files.push(path);
        } else if file_type.is_dir() {
            collect(&path, files)?;
        }
    }
    Ok(())
}

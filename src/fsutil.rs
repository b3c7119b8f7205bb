//! Filesystem helpers shared by the pipeline stages.
//!
//! Fatal operations carry path context in their errors. Cleanup helpers are
//! best-effort and swallow failures: the tool treats "the path is gone" as
//! the only outcome that matters for them.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Create a directory and any missing parents.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("creating directory '{}'", path.display()))
}

/// Remove a directory tree if it exists. Absence is not an error.
pub fn remove_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("removing directory '{}'", path.display()))?;
    }
    Ok(())
}

/// Wipe and recreate a directory (fresh-start policy).
pub fn recreate_dir(path: &Path) -> Result<()> {
    remove_dir(path)?;
    create_dir(path)
}

/// Best-effort removal of a file or directory tree. Errors are swallowed.
pub fn remove_path_best_effort(path: &Path) {
    if path.is_dir() {
        let _ = fs::remove_dir_all(path);
    } else {
        let _ = fs::remove_file(path);
    }
}

/// Copy a single file, failing with both paths in the message.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .with_context(|| format!("copying '{}' to '{}'", from.display(), to.display()))?;
    Ok(())
}

/// Total size in bytes of all regular files under a directory.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}

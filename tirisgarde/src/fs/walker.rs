//! Directory traversal for backup operations.
//!
//! Collects every non-directory entry beneath a root, in a stable
//! (file-name sorted) order so that two runs over the same tree produce
//! archives with the same entry order.

use crate::utils::{BackupError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Information about a file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

impl FileInfo {
    /// Create FileInfo from a DirEntry.
    /// For symlinks, resolves to the target to get the real file size.
    /// Returns None for anything that is not a regular file or a symlink to
    /// one (FIFOs, sockets, devices, symlinked directories, broken links).
    fn from_entry(entry: &DirEntry) -> std::io::Result<Option<Self>> {
        let path = entry.path().to_path_buf();

        let size = if entry.path_is_symlink() {
            match std::fs::metadata(&path) {
                Ok(resolved) if resolved.is_dir() => {
                    debug!("Skipping symlink to directory: {}", path.display());
                    return Ok(None);
                }
                Ok(resolved) if !resolved.is_file() => {
                    debug!("Skipping symlink to special file: {}", path.display());
                    return Ok(None);
                }
                Ok(resolved) => resolved.len(),
                Err(_) => {
                    debug!("Skipping broken symlink: {}", path.display());
                    return Ok(None);
                }
            }
        } else if entry.file_type().is_file() {
            entry.metadata().map_err(std::io::Error::from)?.len()
        } else {
            // Opening a FIFO would block the archiver
            debug!("Skipping special file: {}", path.display());
            return Ok(None);
        };

        Ok(Some(Self { path, size }))
    }
}

/// Walk a directory tree and collect all files
///
/// # Arguments
/// * `root` - Root directory to start walking from
///
/// # Returns
/// * `Ok(Vec<FileInfo>)` - Every file found, in lexical walk order
/// * `Err(BackupError::Walk)` - If the root or any directory below it cannot be read
///
/// # Example
/// ```no_run
/// use tirisgarde::fs::walker::walk_directory;
/// use std::path::Path;
///
/// let files = walk_directory(Path::new("WTF")).unwrap();
/// println!("Found {} files", files.len());
/// ```
pub fn walk_directory(root: &Path) -> Result<Vec<FileInfo>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|source| BackupError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;

        // Skip directories (we only want files for backup)
        if entry.file_type().is_dir() {
            continue;
        }

        if let Some(file_info) = FileInfo::from_entry(&entry)? {
            files.push(file_info);
        }
    }

    Ok(files)
}

/// Total size of a set of walked files
pub fn total_size(files: &[FileInfo]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

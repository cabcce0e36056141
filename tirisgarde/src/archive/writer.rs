//! Zip archive creation.
//!
//! Writes a list of files into a single zip, naming each entry by its path
//! relative to a base directory. Any failure aborts the archive and the
//! partially written file is removed.

use crate::utils::{BackupError, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use indicatif::ProgressBar;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Summary of a finished archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Number of entries written
    pub entries: usize,

    /// Uncompressed bytes written across all entries
    pub bytes: u64,
}

/// Write `files` into a new zip at `dest`.
///
/// `dest` is created or truncated. Every path in `files` must live under
/// `base`; entries are written in the order given. The zip's central
/// directory is written and the file synced before returning.
///
/// # Errors
/// * `BackupError::ArchiveCreate` - `dest` could not be opened; nothing was written
/// * `BackupError::NotUnderBase` - a file is outside `base`
/// * `BackupError::ArchiveEntry` - a source file could not be read or copied
/// * `BackupError::Zip` - the zip container rejected an entry or could not be finalized
pub fn write_archive(
    dest: &Path,
    base: &Path,
    files: &[PathBuf],
    progress: &ProgressBar,
) -> Result<ArchiveSummary> {
    let file = File::create(dest).map_err(|source| BackupError::ArchiveCreate {
        path: dest.to_path_buf(),
        source,
    })?;

    match write_entries(file, base, files, progress) {
        Ok(summary) => {
            progress.finish();
            Ok(summary)
        }
        Err(e) => {
            progress.abandon();
            if let Err(rm) = fs::remove_file(dest) {
                warn!("Failed to remove incomplete archive {}: {}", dest.display(), rm);
            }
            Err(e)
        }
    }
}

fn write_entries(
    file: File,
    base: &Path,
    files: &[PathBuf],
    progress: &ProgressBar,
) -> Result<ArchiveSummary> {
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let mut bytes = 0u64;

    for path in files {
        let relative = path
            .strip_prefix(base)
            .map_err(|_| BackupError::NotUnderBase {
                file: path.clone(),
                base: base.to_path_buf(),
            })?;
        let name = entry_name(relative);

        let mut source = File::open(path).map_err(|source| BackupError::ArchiveEntry {
            file: path.clone(),
            source,
        })?;

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        if let Some(modified) = source
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| zip_timestamp(t.into()))
        {
            options = options.last_modified_time(modified);
        }

        zip.start_file(name.as_str(), options)?;
        let copied = io::copy(&mut source, &mut zip).map_err(|source| BackupError::ArchiveEntry {
            file: path.clone(),
            source,
        })?;

        debug!("Archived {} ({} bytes)", name, copied);
        bytes += copied;
        progress.inc(1);
    }

    let writer = zip.finish()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    Ok(ArchiveSummary {
        entries: files.len(),
        bytes,
    })
}

/// Zip entry name for a relative path: normal components joined with `/`.
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Zip stores DOS timestamps (1980..=2107, local time, 2 s resolution).
fn zip_timestamp(modified: DateTime<Local>) -> Option<zip::DateTime> {
    let year = u16::try_from(modified.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        modified.month() as u8,
        modified.day() as u8,
        modified.hour() as u8,
        modified.minute() as u8,
        modified.second() as u8,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).unwrap();
            entries.push((entry.name().to_string(), contents));
        }
        entries
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let relative: PathBuf = ["Account", "ACC1", "AddOns", "Foo", "Foo.lua"].iter().collect();
        assert_eq!(entry_name(&relative), "Account/ACC1/AddOns/Foo/Foo.lua");
    }

    #[test]
    fn test_write_archive_preserves_relative_paths() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let wtf = temp_dir.path().join("WTF");
        fs::create_dir_all(wtf.join("Account/ACC1/AddOns/Foo"))?;

        let config = wtf.join("Account/ACC1/config.wtf");
        let addon = wtf.join("Account/ACC1/AddOns/Foo/Foo.lua");
        fs::write(&config, b"0123456789")?;
        fs::write(&addon, b"local Foo = {} -- 20")?;

        let dest = temp_dir.path().join("out.zip");
        let pb = ProgressBar::hidden();
        let summary = write_archive(&dest, &wtf, &[config, addon], &pb)?;

        assert_eq!(summary, ArchiveSummary { entries: 2, bytes: 30 });
        assert_eq!(pb.position(), 2);

        let entries = read_entries(&dest);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "Account/ACC1/config.wtf");
        assert_eq!(entries[0].1, b"0123456789");
        assert_eq!(entries[1].0, "Account/ACC1/AddOns/Foo/Foo.lua");
        assert_eq!(entries[1].1.len(), 20);

        Ok(())
    }

    #[test]
    fn test_empty_file_list_produces_valid_archive() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dest = temp_dir.path().join("empty.zip");

        let summary = write_archive(&dest, temp_dir.path(), &[], &ProgressBar::hidden())?;
        assert_eq!(summary.entries, 0);
        assert!(read_entries(&dest).is_empty());

        Ok(())
    }

    #[test]
    fn test_existing_destination_is_truncated() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        fs::create_dir(&src)?;
        fs::write(src.join("a.txt"), b"a")?;

        let dest = temp_dir.path().join("out.zip");
        fs::write(&dest, vec![0xAB; 4096])?;

        write_archive(&dest, &src, &[src.join("a.txt")], &ProgressBar::hidden())?;
        let entries = read_entries(&dest);
        assert_eq!(entries, vec![("a.txt".to_string(), b"a".to_vec())]);

        Ok(())
    }

    #[test]
    fn test_unreadable_source_aborts_and_removes_archive() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        fs::create_dir(&src)?;
        fs::write(src.join("a.txt"), b"a")?;

        let dest = temp_dir.path().join("out.zip");
        let files = vec![src.join("a.txt"), src.join("vanished.txt")];

        let err = write_archive(&dest, &src, &files, &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, BackupError::ArchiveEntry { .. }));
        assert!(!dest.exists());

        Ok(())
    }

    #[test]
    fn test_file_outside_base_is_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        fs::create_dir(&src)?;
        let outside = temp_dir.path().join("outside.txt");
        fs::write(&outside, b"x")?;

        let dest = temp_dir.path().join("out.zip");
        let err = write_archive(&dest, &src, &[outside], &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, BackupError::NotUnderBase { .. }));
        assert!(!dest.exists());

        Ok(())
    }

    #[test]
    fn test_uncreatable_destination_fails_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("missing-dir").join("out.zip");

        let err = write_archive(&dest, temp_dir.path(), &[], &ProgressBar::hidden()).unwrap_err();
        assert!(matches!(err, BackupError::ArchiveCreate { .. }));
    }
}

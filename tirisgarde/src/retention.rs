//! Age-based pruning of old archives.
//!
//! Archives carry their creation time in their file name, so pruning only
//! needs a directory listing. Anything whose name does not parse as an
//! archive name is left alone.

use crate::archive::naming::{parse_archive_name, ARCHIVE_EXTENSION};
use crate::utils::Result;
use chrono::{DateTime, Duration, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one attempted deletion
#[derive(Debug)]
pub struct PruneAttempt {
    pub path: PathBuf,
    pub created: DateTime<Local>,
    pub result: std::io::Result<()>,
}

/// Result of a pruning pass
#[derive(Debug)]
pub struct PruneReport {
    /// Archives strictly older than this were deleted; `None` when the
    /// retention window reaches past the earliest representable time
    pub cutoff: Option<DateTime<Local>>,

    /// Every deletion attempted, successful or not
    pub attempts: Vec<PruneAttempt>,

    /// Archives at or after the cutoff
    pub kept: usize,

    /// Matching files whose name is not an archive timestamp
    pub skipped: usize,
}

impl PruneReport {
    /// Paths that were actually removed
    pub fn deleted(&self) -> impl Iterator<Item = &Path> {
        self.attempts
            .iter()
            .filter(|a| a.result.is_ok())
            .map(|a| a.path.as_path())
    }

    /// Attempts that failed
    pub fn failures(&self) -> impl Iterator<Item = &PruneAttempt> {
        self.attempts.iter().filter(|a| a.result.is_err())
    }
}

/// Retention cutoff: `now` minus `max_age_days` whole days.
///
/// Returns `None` if that instant is out of range, in which case no archive
/// is old enough to prune.
pub fn cutoff(now: DateTime<Local>, max_age_days: u32) -> Option<DateTime<Local>> {
    let window = Duration::try_days(i64::from(max_age_days))?;
    now.checked_sub_signed(window)
}

/// Delete archives in `dest` older than `max_age_days`, measured from now.
pub fn prune(dest: &Path, max_age_days: u32) -> Result<PruneReport> {
    prune_at(dest, max_age_days, Local::now())
}

/// Delete archives in `dest` older than `max_age_days` before `now`.
///
/// Only files directly inside `dest` are considered. A failed deletion is
/// logged and recorded in the report; it does not stop the pass.
///
/// # Errors
/// Returns an error only if the listing pattern cannot be built.
pub fn prune_at(dest: &Path, max_age_days: u32, now: DateTime<Local>) -> Result<PruneReport> {
    prune_with(dest, max_age_days, now, |path| std::fs::remove_file(path))
}

/// Like [`prune_at`], deleting each expired archive with `remove`.
pub fn prune_with<F>(
    dest: &Path,
    max_age_days: u32,
    now: DateTime<Local>,
    mut remove: F,
) -> Result<PruneReport>
where
    F: FnMut(&Path) -> std::io::Result<()>,
{
    let cutoff = cutoff(now, max_age_days);
    let pattern = archive_pattern(dest);

    match cutoff {
        Some(cutoff) => debug!("Pruning with pattern {} (cutoff {})", pattern, cutoff),
        None => debug!("Retention of {} days keeps every archive", max_age_days),
    }

    let mut report = PruneReport {
        cutoff,
        attempts: Vec::new(),
        kept: 0,
        skipped: 0,
    };

    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry {}: {}", e.path().display(), e.error());
                continue;
            }
        };

        if !path.is_file() {
            continue;
        }

        let Some(created) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_archive_name)
        else {
            debug!("Ignoring non-archive file: {}", path.display());
            report.skipped += 1;
            continue;
        };

        let expired = matches!(cutoff, Some(cutoff) if created < cutoff);
        if !expired {
            report.kept += 1;
            continue;
        }

        info!("Pruning: {}", path.display());
        let result = remove(&path);
        if let Err(e) = &result {
            warn!("Failed to prune {}: {}", path.display(), e);
        }

        report.attempts.push(PruneAttempt {
            path,
            created,
            result,
        });
    }

    Ok(report)
}

/// `<dest>/*.zip`, with `dest` escaped so glob metacharacters in the
/// directory name match literally.
fn archive_pattern(dest: &Path) -> String {
    let dir = glob::Pattern::escape(&dest.to_string_lossy());
    let sep = std::path::MAIN_SEPARATOR;
    if dir.ends_with(sep) || dir.ends_with('/') {
        format!("{}*.{}", dir, ARCHIVE_EXTENSION)
    } else {
        format!("{}{}*.{}", dir, sep, ARCHIVE_EXTENSION)
    }
}

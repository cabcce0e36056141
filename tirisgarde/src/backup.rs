//! Backup runner - archives the source tree, then prunes old archives.

use crate::archive::{archive_file_name, write_archive, ArchiveSummary};
use crate::config::{Config, SOURCE_SUBDIR};
use crate::fs::walker::{total_size, walk_directory};
use crate::progress::archive_bar;
use crate::retention::{prune, PruneReport};
use crate::utils::{BackupError, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// One backup run
#[derive(Debug, Clone)]
pub struct BackupJob {
    /// Root of the tree to archive; entry names are relative to it
    pub source_root: PathBuf,

    /// Directory holding the archives
    pub destination: PathBuf,

    /// Archives older than this many days are pruned
    pub max_age_days: u32,

    /// Hide the progress bar
    pub quiet: bool,
}

/// Backup execution result
#[derive(Debug)]
pub struct BackupResult {
    pub archive_path: PathBuf,
    pub archive: ArchiveSummary,
    pub prune: PruneReport,
    pub duration_secs: u64,
}

impl BackupJob {
    /// Job for a game client directory: backs up `<client>/WTF` into the
    /// configured destination. Relative paths resolve against the current directory.
    pub fn for_client(client_dir: &Path, config: &Config) -> Result<Self> {
        Ok(Self {
            source_root: std::path::absolute(client_dir.join(SOURCE_SUBDIR))?,
            destination: std::path::absolute(&config.dest)?,
            max_age_days: config.max_age,
            quiet: false,
        })
    }
}

/// Execute a backup job.
///
/// Walking the source, creating the destination and writing the archive are
/// fatal on failure. Pruning problems with individual files are reported in
/// the result instead.
pub fn run_backup(job: &BackupJob) -> Result<BackupResult> {
    let start_time = Instant::now();

    let files = walk_directory(&job.source_root)?;
    info!(
        "{} files to archive ({} bytes)",
        files.len(),
        total_size(&files)
    );

    std::fs::create_dir_all(&job.destination).map_err(|source| BackupError::Destination {
        path: job.destination.clone(),
        source,
    })?;

    let archive_name = archive_file_name(&Local::now());
    let archive_path = job.destination.join(&archive_name);
    info!("Archiving to: {}", archive_path.display());

    let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
    let progress = archive_bar(paths.len() as u64, &archive_name, job.quiet);
    let archive = write_archive(&archive_path, &job.source_root, &paths, &progress)?;
    info!("Archive completed: {}", archive_path.display());

    info!("Pruning backups older than {} days...", job.max_age_days);
    let prune_report = prune(&job.destination, job.max_age_days)?;
    let failed = prune_report.failures().count();
    if failed > 0 {
        warn!("{} expired backups could not be removed", failed);
    }

    Ok(BackupResult {
        archive_path,
        archive,
        prune: prune_report,
        duration_secs: start_time.elapsed().as_secs(),
    })
}

//! tirisgarde - WoW config backup tool
//!
//! Backs up the client's WTF directory to a destination folder as a zip
//! archive, then removes archives older than the configured age.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tirisgarde::config::{Config, Overrides};
use tirisgarde::{run_backup, utils, BackupJob};

#[derive(Parser, Debug)]
#[command(
    name = "tirisgarde",
    author,
    version,
    about = "WoW config backup tool",
    long_about = "Backup WoW WTF directory to a specific location as an archive."
)]
struct Args {
    /// WoW client directory (usually 'World of Warcraft/_retail_')
    #[arg(short = 'i', long, value_name = "DIR", default_value = ".")]
    source: PathBuf,

    /// Folder to store backups [default: ./WTF-Backup]
    #[arg(short = 'o', long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Max age for backups, in days [default: 30]
    #[arg(long, value_name = "DAYS")]
    max_age: Option<u32>,

    /// Path to configuration file [default: <source>/.tirisgarde.toml]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Do not show the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Do not write the effective settings back to the configuration file
    #[arg(long)]
    no_save: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let source = std::path::absolute(&args.source)
        .with_context(|| format!("Invalid source directory {}", args.source.display()))?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Config::default_path(&source));

    // Load configuration: file, then environment, then flags
    let config_exists = config_path.exists();
    let mut config = Config::from_file(&config_path)
        .with_context(|| format!("Failed to load config file {}", config_path.display()))?;
    config.apply_env()?;
    config.apply_overrides(&Overrides {
        dest: args.dest,
        max_age: args.max_age,
        log_level: args.log_level,
    });

    // Initialize logging
    utils::logger::init(&config.log.level)?;

    tracing::info!("Starting tirisgarde v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!("Using config file: {}", config_path.display());
    }

    let mut job = BackupJob::for_client(&source, &config)?;
    job.quiet = args.quiet;

    let result = run_backup(&job).context("Backup failed")?;

    tracing::info!(
        "Backup finished in {}s: {} files, {} bytes, {} expired archives pruned",
        result.duration_secs,
        result.archive.entries,
        result.archive.bytes,
        result.prune.deleted().count()
    );

    if !args.no_save {
        config
            .save(&config_path)
            .with_context(|| format!("Failed to save config file {}", config_path.display()))?;
    }

    Ok(())
}

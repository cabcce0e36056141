//! tirisgarde library
//!
//! Backs up a World of Warcraft client's `WTF` directory into timestamped zip
//! archives and prunes archives past their retention window.

pub mod archive;
pub mod backup;
pub mod config;
pub mod fs;
pub mod progress;
pub mod retention;
pub mod utils;

// Re-export commonly used types
pub use backup::{run_backup, BackupJob, BackupResult};
pub use config::Config;
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;

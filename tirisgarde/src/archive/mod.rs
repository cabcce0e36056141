//! Backup archives: naming and creation.

pub mod naming;
pub mod writer;

pub use naming::{archive_file_name, parse_archive_name, ARCHIVE_EXTENSION, ARCHIVE_TIME_FORMAT};
pub use writer::{write_archive, ArchiveSummary};

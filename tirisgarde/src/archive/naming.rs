//! Archive file naming.
//!
//! An archive's file name is the only record of when it was created, so the
//! same format string is used to generate names and to read them back.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// strftime format of the timestamp part of an archive name (local time).
pub const ARCHIVE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Extension of archives produced by this tool.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Build the archive file name for a creation time, e.g. `2024-06-15_13-45-07.zip`.
pub fn archive_file_name(created: &DateTime<Local>) -> String {
    format!(
        "{}.{}",
        created.format(ARCHIVE_TIME_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// Parse an archive file name back into its creation time.
///
/// Returns `None` for anything this tool would not have produced: a wrong
/// extension, a malformed timestamp, or a timestamp that is not written in
/// canonical zero-padded form. Local times that do not exist (skipped by a
/// DST transition) are rejected too; ambiguous ones resolve to the earlier
/// instant.
pub fn parse_archive_name(file_name: &str) -> Option<DateTime<Local>> {
    let stem = file_name
        .strip_suffix(ARCHIVE_EXTENSION)?
        .strip_suffix('.')?;
    let naive = NaiveDateTime::parse_from_str(stem, ARCHIVE_TIME_FORMAT).ok()?;

    // chrono accepts e.g. unpadded fields; only the exact rendering counts.
    if naive.format(ARCHIVE_TIME_FORMAT).to_string() != stem {
        return None;
    }

    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_archive_file_name() {
        let ts = Local.with_ymd_and_hms(2024, 1, 5, 7, 3, 9).unwrap();
        assert_eq!(archive_file_name(&ts), "2024-01-05_07-03-09.zip");
    }

    #[test]
    fn test_round_trip_truncates_to_seconds() {
        let now = Local::now();
        let parsed = parse_archive_name(&archive_file_name(&now)).unwrap();
        assert_eq!(parsed, now.with_nanosecond(0).unwrap());
    }

    #[test]
    fn test_round_trip_fixed_time() {
        let ts = Local.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_archive_name("2020-01-01_00-00-00.zip"), Some(ts));
    }

    #[test]
    fn test_rejects_foreign_names() {
        for name in [
            "notes.txt",
            "backup.zip.bak",
            "backup.zip",
            "2020-01-01_00-00-00.tar.gz",
            "2020-01-01_00-00-00zip",
            "2020-01-01 00-00-00.zip",
            "2020-13-01_00-00-00.zip",
            "2020-01-01_24-00-00.zip",
            "2020-1-1_0-0-0.zip",
            "2020-01-01_00-00-00.ZIP",
            "x2020-01-01_00-00-00.zip",
        ] {
            assert_eq!(parse_archive_name(name), None, "{name} should not parse");
        }
    }
}

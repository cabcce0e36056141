//! Progress display for archive creation.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const ARCHIVE_TEMPLATE: &str = "{msg} [{elapsed_precise}] {wide_bar} {pos}/{len} files";

/// Progress bar counting files written into an archive.
///
/// `label` is shown in front of the bar (usually the archive file name).
/// A quiet bar tracks position but never draws.
pub fn archive_bar(total_files: u64, label: &str, quiet: bool) -> ProgressBar {
    let pb = ProgressBar::new(total_files);
    if quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::with_template(ARCHIVE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(label.to_string());
    pb
}

//! Output module for progress lines and crawl summaries
//!
//! Standard output carries only what a user reads: one line per written image
//! and the final summary. Diagnostics go through `tracing` to standard error.

pub mod stats;

pub use stats::{format_summary, log_statistics, print_summary, CrawlStatistics};

use crate::crawler::DownloadedFile;

/// Formats the progress line of a written image
pub fn format_download(file: &DownloadedFile) -> String {
    format!(
        "[ok] {} -> {}",
        file.source_url,
        file.local_path.display()
    )
}

/// Prints the progress line of a written image to stdout
pub fn report_download(file: &DownloadedFile) {
    println!("{}", format_download(file));
}

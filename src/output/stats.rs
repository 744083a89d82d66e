//! Crawl statistics and their console rendering

use std::path::PathBuf;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Pages fetched successfully (200 with a body)
    pub pages_fetched: u64,

    /// Pages whose fetch failed after fallback
    pub pages_failed: u64,

    /// Distinct image URLs a download was attempted for
    pub images_attempted: u64,

    /// New files written
    pub images_downloaded: u64,

    /// Image fetches that failed after fallback
    pub images_failed: u64,

    /// Images skipped because identical bytes were already stored
    pub duplicates_skipped: u64,

    /// Images skipped because no allowed extension could be determined
    pub images_rejected: u64,

    /// Images fetched but not written because of an I/O error
    pub write_failures: u64,

    /// Absolute path of the output directory
    pub output_dir: PathBuf,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

/// Formats the final one-line summary
pub fn format_summary(stats: &CrawlStatistics) -> String {
    format!(
        "Done. Downloaded: {} image(s) into {}",
        stats.images_downloaded,
        stats.output_dir.display()
    )
}

/// Prints the final summary line to stdout
pub fn print_summary(stats: &CrawlStatistics) {
    println!();
    println!("{}", format_summary(stats));
}

/// Logs the per-category breakdown at info level
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        "Pages: {} fetched, {} failed",
        stats.pages_fetched,
        stats.pages_failed
    );
    tracing::info!(
        "Images: {} attempted, {} downloaded, {} duplicate, {} unsupported, {} fetch failures, {} write failures",
        stats.images_attempted,
        stats.images_downloaded,
        stats.duplicates_skipped,
        stats.images_rejected,
        stats.images_failed,
        stats.write_failures
    );
    tracing::info!("Crawl finished in {:?}", stats.elapsed);
}

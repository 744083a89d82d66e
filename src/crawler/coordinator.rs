//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that ties together:
//! - The scheduler's FIFO frontier and dedup sets
//! - Page and image fetching through the fetch layer
//! - Image and link extraction
//! - Writing images to the output directory
//!
//! Processing is strictly sequential: one page or image request is in flight at
//! any time. A failure inside a task is logged and the task contributes nothing;
//! it never ends the crawl.

use crate::config::Config;
use crate::crawler::downloader::{DownloadOutcome, Downloader};
use crate::crawler::fallback::CurlFetcher;
use crate::crawler::fetcher::{DirectFetcher, FetchLayer};
use crate::crawler::parser::{extract_images, extract_links};
use crate::crawler::scheduler::Scheduler;
use crate::output::{self, CrawlStatistics};
use crate::state::{CrawlTask, TaskState};
use crate::Result;
use std::time::Instant;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetch: FetchLayer,
    downloader: Downloader,
    scheduler: Scheduler,
    page_referer: String,
    stats: CrawlStatistics,
}

impl Coordinator {
    /// Creates a coordinator using the direct client with the curl fallback
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `start_url` - The validated start URL
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SpiderError)` - The HTTP client could not be built
    pub fn new(config: Config, start_url: Url) -> Result<Self> {
        let primary = DirectFetcher::from_config(&config.fetch)?;
        let fallback = CurlFetcher::from_config(&config.fetch);
        let fetch = FetchLayer::new(
            Box::new(primary),
            Some(Box::new(fallback)),
            config.fetch.timeout(),
        );

        Ok(Self::with_fetch_layer(config, start_url, fetch))
    }

    /// Creates a coordinator around an existing fetch layer
    pub fn with_fetch_layer(config: Config, start_url: Url, fetch: FetchLayer) -> Self {
        let page_referer = config
            .fetch
            .page_referer
            .clone()
            .unwrap_or_else(|| start_url.to_string());
        let downloader = Downloader::new(config.crawler.output_dir.clone());
        let scheduler = Scheduler::new(start_url, &config.crawler, config.fetch.delay());

        Self {
            config,
            fetch,
            downloader,
            scheduler,
            page_referer,
            stats: CrawlStatistics::default(),
        }
    }

    /// Runs the main crawl loop until the queue is drained
    ///
    /// 1. Creates the output directory
    /// 2. Takes the next task from the scheduler
    /// 3. Fetches the page, extracts and downloads its images
    /// 4. Enqueues followed links one level deeper
    ///
    /// Only a failure to create the output directory is returned as an error.
    pub async fn run(mut self) -> Result<CrawlStatistics> {
        let start_time = Instant::now();
        let output_dir = &self.config.crawler.output_dir;

        tokio::fs::create_dir_all(output_dir).await?;
        self.stats.output_dir = tokio::fs::canonicalize(output_dir).await?;

        tracing::info!(
            "Starting crawl of {} (recursive: {}, max depth: {}) into {}",
            self.scheduler.start_url(),
            self.config.crawler.recursive,
            self.config.crawler.max_depth,
            self.stats.output_dir.display()
        );

        while let Some(task) = self.scheduler.next_task() {
            if let Err(e) = self.process_task(&task).await {
                tracing::error!("Error processing {}: {}", task.url, e);
            }
        }

        tracing::info!("Frontier is empty, crawl complete");

        self.stats.elapsed = start_time.elapsed();
        output::log_statistics(&self.stats);

        Ok(self.stats)
    }

    /// Processes a single page task
    ///
    /// The task moves `Queued → Fetching → Extracting → EnqueuingChildren → Done`,
    /// or `Fetching → Discarded` when the page cannot be fetched.
    async fn process_task(&mut self, task: &CrawlTask) -> Result<()> {
        let mut state = TaskState::Queued;
        tracing::info!("Processing {} (depth {})", task.url, task.depth);

        state.advance(TaskState::Fetching)?;
        let fetched = self
            .fetch
            .fetch(&task.url, Some(self.page_referer.as_str()))
            .await;
        self.scheduler.pause().await;

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("[fetch] status {:?}: {} ({})", e.status(), task.url, e);
                self.stats.pages_failed += 1;
                state.advance(TaskState::Discarded)?;
                return Ok(());
            }
        };
        self.stats.pages_fetched += 1;

        state.advance(TaskState::Extracting)?;
        let html = String::from_utf8_lossy(&page.body);

        let images = extract_images(&task.url, &html);
        tracing::debug!("Found {} image candidate(s) on {}", images.len(), task.url);

        for image in &images {
            if !self.scheduler.claim_image(image) {
                continue;
            }
            self.download_image(image, &task.url).await;
            self.scheduler.pause().await;
        }

        state.advance(TaskState::EnqueuingChildren)?;
        if self.scheduler.accepts_children(task.depth) {
            let links = extract_links(&task.url, &html);
            let added = self.scheduler.enqueue_children(&links, task.depth);
            tracing::debug!(
                "Enqueued {} of {} link(s) from {}, {} in frontier",
                added,
                links.len(),
                task.url,
                self.scheduler.frontier_size()
            );
        }

        state.advance(TaskState::Done)?;
        Ok(())
    }

    /// Fetches one image and hands it to the downloader
    ///
    /// Every outcome is counted; none is propagated.
    async fn download_image(&mut self, image: &Url, page: &Url) {
        self.stats.images_attempted += 1;

        let fetched = match self.fetch.fetch(image, Some(page.as_str())).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("[download] status {:?}: {} ({})", e.status(), image, e);
                self.stats.images_failed += 1;
                return;
            }
        };

        match self
            .downloader
            .download(image, &fetched, self.scheduler.state_mut())
            .await
        {
            Ok(DownloadOutcome::Written(file)) => {
                self.stats.images_downloaded += 1;
                output::report_download(&file);
            }
            Ok(DownloadOutcome::DuplicateContent { .. }) => self.stats.duplicates_skipped += 1,
            Ok(DownloadOutcome::UnsupportedType) => self.stats.images_rejected += 1,
            Err(e) => {
                tracing::warn!("[download] {}", e);
                self.stats.write_failures += 1;
            }
        }
    }
}

/// Runs a complete crawl from `start_url`
///
/// # Example
///
/// ```no_run
/// use arachnida::config::Config;
/// use arachnida::crawler::run_crawl;
/// use arachnida::url::parse_start_url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let start = parse_start_url("https://example.com/gallery")?;
/// let stats = run_crawl(Config::default(), start).await?;
/// println!("{} image(s) downloaded", stats.images_downloaded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, start_url: Url) -> Result<CrawlStatistics> {
    Coordinator::new(config, start_url)?.run().await
}

//! Scheduler for the breadth-first crawl frontier
//!
//! This module handles:
//! - FIFO ordering of page tasks by discovery
//! - The visited-page and seen-image checks
//! - Depth and same-host bounds on followed links
//! - The politeness delay between requests

use crate::config::CrawlerConfig;
use crate::crawler::parser::has_allowed_extension;
use crate::state::{CrawlState, CrawlTask};
use crate::url::{is_fetchable_scheme, same_host};
use std::time::Duration;
use url::Url;

/// Scheduler owns the crawl state for one invocation
///
/// The scheduler tracks:
/// - The FIFO queue of `(url, depth)` tasks
/// - Visited pages, seen image URLs and stored content hashes
/// - The recursion bounds (flag, maximum depth, start host)
pub struct Scheduler {
    /// Dedup sets and the task queue
    state: CrawlState,

    /// The crawl's start URL; followed links must share its host
    start_url: Url,

    /// Follow same-host links at all
    recursive: bool,

    /// Deepest task fetched when recursive
    max_depth: u32,

    /// Pause after each page fetch and image download attempt
    delay: Duration,
}

impl Scheduler {
    /// Creates a scheduler whose queue holds the start URL at depth 0
    ///
    /// # Arguments
    ///
    /// * `start_url` - The validated start URL
    /// * `config` - The crawler configuration (recursion flag and maximum depth)
    /// * `delay` - The politeness delay
    pub fn new(start_url: Url, config: &CrawlerConfig, delay: Duration) -> Self {
        let mut state = CrawlState::new();
        state.enqueue(CrawlTask::new(start_url.clone(), 0));

        Self {
            state,
            start_url,
            recursive: config.recursive,
            max_depth: config.max_depth,
            delay,
        }
    }

    /// Gets the next page to fetch
    ///
    /// Tasks whose page was already visited are dropped, as are tasks beyond the
    /// depth bound. The returned page is marked visited before it is handed out,
    /// so it cannot be queued again while it is being processed.
    ///
    /// # Returns
    ///
    /// * `Some(CrawlTask)` - A page to fetch
    /// * `None` - The queue is drained and the crawl is over
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        while let Some(task) = self.state.dequeue() {
            if self.state.is_page_visited(&task.url) {
                tracing::trace!("Skipping already visited {}", task.url);
                continue;
            }

            if task.depth > self.depth_limit() {
                tracing::debug!("Discarding {} at depth {}", task.url, task.depth);
                continue;
            }

            self.state.mark_page_visited(&task.url);
            return Some(task);
        }

        None
    }

    /// Whether a page at `depth` may have its links enqueued
    pub fn accepts_children(&self, depth: u32) -> bool {
        self.recursive && depth < self.max_depth
    }

    /// Decides whether a link found on a page at `depth` is followed
    ///
    /// A link is followed when recursion is on, the page is shallower than the
    /// maximum depth, the link is http(s) on the start URL's host, and it has not
    /// been visited yet. Links to images are never followed as pages: they are
    /// already handled as image candidates.
    pub fn should_follow(&self, link: &Url, depth: u32) -> bool {
        self.accepts_children(depth)
            && is_fetchable_scheme(link)
            && same_host(self.start_url.as_str(), link.as_str())
            && !has_allowed_extension(link)
            && !self.state.is_image_seen(link)
            && !self.state.is_page_visited(link)
    }

    /// Enqueues every followed link at `depth + 1`
    ///
    /// # Returns
    ///
    /// The number of tasks added to the queue
    pub fn enqueue_children(&mut self, links: &[Url], depth: u32) -> usize {
        let mut added = 0;

        for link in links {
            if self.should_follow(link, depth) {
                self.state.enqueue(CrawlTask::new(link.clone(), depth + 1));
                added += 1;
            }
        }

        added
    }

    /// Claims an image URL for download; false if it was already claimed
    pub fn claim_image(&mut self, url: &Url) -> bool {
        self.state.mark_image_seen(url)
    }

    /// Waits out the politeness delay
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Mutable access for the downloader's content-hash bookkeeping
    pub fn state_mut(&mut self) -> &mut CrawlState {
        &mut self.state
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Returns the number of tasks in the queue
    pub fn frontier_size(&self) -> usize {
        self.state.queue_len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.state.queue_len() == 0
    }

    /// Without recursion only the start page (depth 0) is ever processed
    fn depth_limit(&self) -> u32 {
        if self.recursive {
            self.max_depth
        } else {
            0
        }
    }
}

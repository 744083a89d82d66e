//! Deduplication sets and FIFO queue owned by one crawl invocation

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A page waiting to be fetched, with its distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: u32,
}

impl CrawlTask {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Mutable state of a single crawl
///
/// All check-then-insert operations return whether the value was new, so a
/// caller never has to test membership and insert in two steps.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited_pages: HashSet<String>,
    seen_image_urls: HashSet<String>,
    seen_content_hashes: HashSet<String>,
    queue: VecDeque<CrawlTask>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a page as visited; returns false if it already was
    pub fn mark_page_visited(&mut self, url: &Url) -> bool {
        self.visited_pages.insert(url.as_str().to_string())
    }

    pub fn is_page_visited(&self, url: &Url) -> bool {
        self.visited_pages.contains(url.as_str())
    }

    /// Marks an image URL as seen; returns false if it already was
    pub fn mark_image_seen(&mut self, url: &Url) -> bool {
        self.seen_image_urls.insert(url.as_str().to_string())
    }

    pub fn is_image_seen(&self, url: &Url) -> bool {
        self.seen_image_urls.contains(url.as_str())
    }

    /// Records a content hash; returns false if the same bytes were already stored
    pub fn record_content_hash(&mut self, hash: &str) -> bool {
        if self.seen_content_hashes.contains(hash) {
            return false;
        }
        self.seen_content_hashes.insert(hash.to_string())
    }

    pub fn has_content_hash(&self, hash: &str) -> bool {
        self.seen_content_hashes.contains(hash)
    }

    /// Appends a task to the back of the queue
    pub fn enqueue(&mut self, task: CrawlTask) {
        self.queue.push_back(task);
    }

    /// Takes the task at the front of the queue
    pub fn dequeue(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited_pages.len()
    }

    pub fn seen_image_count(&self) -> usize {
        self.seen_image_urls.len()
    }
}

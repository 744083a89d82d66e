//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the dedup sets (visited pages, seen image URLs, content hashes) and the FIFO task queue
//! - `CrawlTask`: a page URL paired with its depth
//! - `TaskState`: the lifecycle of a single task (queued, fetching, extracting, ...)

mod crawl_state;
mod task_state;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlTask};
pub use task_state::TaskState;

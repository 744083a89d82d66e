//! Crawler module for page fetching and image harvesting
//!
//! This module contains the crawl engine, including:
//! - HTTP fetching with an external-process fallback
//! - HTML extraction of image candidates and page links
//! - Content-addressed image downloads
//! - Breadth-first scheduling with depth bounds and a politeness delay
//! - Overall crawl coordination

mod coordinator;
mod downloader;
mod fallback;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use downloader::{
    build_filename, content_hash, resolve_extension, sanitize_filename, DownloadOutcome,
    DownloadedFile, Downloader, HASH_PREFIX_LEN,
};
pub use fallback::CurlFetcher;
pub use fetcher::{build_http_client, DirectFetcher, FetchLayer, FetchRequest, FetchResult, Fetcher};
pub use parser::{
    allowed_extension_of, extract_images, extract_links, has_allowed_extension, parse_srcset,
    scan_embedded_images, ALLOWED_EXTENSIONS,
};
pub use scheduler::Scheduler;

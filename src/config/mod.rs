//! Configuration module for Arachnida
//!
//! Every setting has a default, so a crawl can run from command-line flags alone.
//! An optional TOML file can tune the fetch layer (timeout, delay, headers,
//! fallback program) that the command line leaves fixed.
//!
//! # Example
//!
//! ```no_run
//! use arachnida::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spider.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetchConfig, DEFAULT_ACCEPT, DEFAULT_ACCEPT_LANGUAGE,
    DEFAULT_DELAY_MS, DEFAULT_FALLBACK_PROGRAM, DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT_DIR,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;

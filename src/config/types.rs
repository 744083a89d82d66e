use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default maximum recursion depth
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Default output directory for downloaded images
pub const DEFAULT_OUTPUT_DIR: &str = "./data";

/// Default per-request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Default politeness delay between requests (milliseconds)
pub const DEFAULT_DELAY_MS: u64 = 600;

/// Browser-like user agent sent by both fetch backends
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 ArachnidaSpider/1.0";

pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// External program used when the direct client is blocked
pub const DEFAULT_FALLBACK_PROGRAM: &str = "curl";

/// Main configuration structure for Arachnida
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Follow same-host links from the start page
    pub recursive: bool,

    /// Maximum depth to crawl from the start URL (ignored unless recursive)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Directory the images are written to (created if absent)
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Request configuration shared by the direct and fallback fetchers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout applied to every individual fetch (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Pause after each page fetch and each image download attempt (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Referer sent with page requests; the start URL when unset
    #[serde(rename = "page-referer")]
    pub page_referer: Option<String>,

    /// Program spawned for the fallback fetch
    #[serde(rename = "fallback-program")]
    pub fallback_program: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_ms: DEFAULT_DELAY_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            page_referer: None,
            fallback_program: DEFAULT_FALLBACK_PROGRAM.to_string(),
        }
    }
}

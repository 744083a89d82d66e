//! HTTP fetcher implementation
//!
//! This module handles all outbound requests for the crawler, including:
//! - The `Fetcher` capability shared by the direct client and the fallback
//! - Building the reqwest client with a browser-like header set
//! - The `FetchLayer`, which owns the decision of when to fall back

use crate::config::FetchConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Statuses that indicate the direct client was blocked rather than the resource missing
const BLOCKED_STATUSES: &[u16] = &[403, 429];

/// Maximum redirect hops followed by the direct client
const MAX_REDIRECTS: usize = 10;

/// One outbound request
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub url: &'a Url,
    pub timeout: Duration,
    pub referer: Option<&'a str>,
}

/// Raw outcome of a single fetch backend
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// HTTP status code (None when the backend cannot tell)
    pub status: Option<u16>,

    /// Response headers with lower-cased names (empty for the fallback backend)
    pub headers: HashMap<String, String>,

    /// Response body
    pub body: Vec<u8>,
}

impl FetchResult {
    /// Value of the Content-Type header, if the backend surfaced one
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// A 200 response with a non-empty body
    pub fn is_success(&self) -> bool {
        self.status == Some(200) && !self.body.is_empty()
    }
}

/// A mechanism able to retrieve the bytes behind a URL
///
/// Implementations report every response they receive as `Ok`, whatever its
/// status; `Err` is reserved for failures that produced no response at all.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short backend name used in diagnostics
    fn name(&self) -> &'static str;

    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchResult, FetchError>;
}

/// Builds an HTTP client with a browser-like header set
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use arachnida::config::FetchConfig;
/// use arachnida::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, header::ACCEPT, &config.accept);
    insert_header(&mut headers, header::ACCEPT_LANGUAGE, &config.accept_language);
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

fn insert_header(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Ignoring invalid {} header value: {:?}", name, value),
    }
}

/// Primary fetch backend: a direct reqwest client
pub struct DirectFetcher {
    client: Client,
}

impl DirectFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Fetcher for DirectFetcher {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchResult, FetchError> {
        let mut builder = self
            .client
            .get(request.url.as_str())
            .timeout(request.timeout);
        if let Some(referer) = request.referer {
            builder = builder.header(header::REFERER, referer);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Transport(classify_transport_error(&e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(classify_transport_error(&e)))?;

        Ok(FetchResult {
            status: Some(status),
            headers,
            body: body.to_vec(),
        })
    }
}

fn classify_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        format!("redirect error: {}", error)
    } else {
        error.to_string()
    }
}

/// Fetch capability with automatic fallback
///
/// # Request Flow
///
/// | Primary outcome | Action |
/// |-----------------|--------|
/// | 200 with body | Return it |
/// | HTTP 403 / 429 | Try the fallback |
/// | Transport failure (no status) | Try the fallback |
/// | Any other status | `FetchError::Status` |
///
/// A fallback success (200 with body) replaces the primary outcome; a fallback
/// failure leaves the primary outcome in place. No retry loop exists here.
pub struct FetchLayer {
    primary: Box<dyn Fetcher>,
    fallback: Option<Box<dyn Fetcher>>,
    timeout: Duration,
}

impl FetchLayer {
    pub fn new(
        primary: Box<dyn Fetcher>,
        fallback: Option<Box<dyn Fetcher>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// Fetches `url`, yielding only complete 200 responses as `Ok`
    pub async fn fetch(&self, url: &Url, referer: Option<&str>) -> Result<FetchResult, FetchError> {
        let request = FetchRequest {
            url,
            timeout: self.timeout,
            referer,
        };

        let primary = self.primary.fetch(&request).await;
        if let Err(e) = &primary {
            tracing::warn!("[fetch:{}] failed: {} ({})", self.primary.name(), url, e);
        }

        if needs_fallback(&primary) {
            if let Some(fallback) = &self.fallback {
                tracing::debug!(
                    "[fetch:{}] blocked or failed for {}, trying {}",
                    self.primary.name(),
                    url,
                    fallback.name()
                );

                match fallback.fetch(&request).await {
                    Ok(result) if result.is_success() => return Ok(result),
                    Ok(result) => tracing::warn!(
                        "[fetch:{}] unusable response for {} (status {:?}, {} bytes)",
                        fallback.name(),
                        url,
                        result.status,
                        result.body.len()
                    ),
                    Err(e) => tracing::warn!("[fetch:{}] failed: {} ({})", fallback.name(), url, e),
                }
            }
        }

        into_outcome(primary)
    }
}

fn needs_fallback(outcome: &Result<FetchResult, FetchError>) -> bool {
    match outcome {
        Ok(result) => match result.status {
            Some(status) => BLOCKED_STATUSES.contains(&status),
            None => true,
        },
        Err(_) => true,
    }
}

fn into_outcome(outcome: Result<FetchResult, FetchError>) -> Result<FetchResult, FetchError> {
    let result = outcome?;
    match result.status {
        Some(200) if result.body.is_empty() => Err(FetchError::EmptyBody),
        Some(200) => Ok(result),
        Some(status) => Err(FetchError::Status { status }),
        None => Err(FetchError::Transport("no status received".to_string())),
    }
}

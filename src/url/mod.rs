//! URL handling module for Arachnida
//!
//! This module provides reference resolution, same-host checks and validation
//! of the crawl's start URL.

mod host;
mod normalize;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use host::same_host;
pub use normalize::{is_fetchable_scheme, normalize};

/// Validates and parses the start URL of a crawl
///
/// The URL must begin with `http://` or `https://` (case-insensitive) and carry a
/// host. This is the only check allowed to stop a crawl before it starts.
///
/// # Examples
///
/// ```
/// use arachnida::url::parse_start_url;
///
/// assert!(parse_start_url("https://example.com").is_ok());
/// assert!(parse_start_url("ftp://example.com").is_err());
/// assert!(parse_start_url("example.com").is_err());
/// ```
pub fn parse_start_url(raw: &str) -> UrlResult<Url> {
    let raw = raw.trim();

    let has_http_prefix = ["http://", "https://"].iter().any(|prefix| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    });
    if !has_http_prefix {
        return Err(UrlError::InvalidScheme(raw.to_string()));
    }

    let mut url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

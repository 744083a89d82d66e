//! Persisting fetched images, one file per distinct content
//!
//! Identity is the content hash, not the source URL: two URLs serving the same
//! bytes produce one file.

use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::allowed_extension_of;
use crate::state::CrawlState;
use crate::SpiderError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// Number of hex characters of the SHA-256 digest kept as the dedup key
pub const HASH_PREFIX_LEN: usize = 16;

/// Content-Type substrings mapped to file extensions
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/bmp", ".bmp"),
];

/// Name used when the URL has no usable basename
const FALLBACK_NAME: &str = "file";

/// An image written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub source_url: Url,
    pub content_hash: String,
    pub local_path: PathBuf,
}

/// What happened to one fetched image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A new file was written
    Written(DownloadedFile),

    /// The same bytes were already stored under another name
    DuplicateContent { content_hash: String },

    /// Neither the Content-Type nor the URL path gave an allowed extension
    UnsupportedType,
}

impl DownloadOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Writes fetched images into a flat output directory
#[derive(Debug, Clone)]
pub struct Downloader {
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stores the bytes of `image_url` unless the same content was already stored
    ///
    /// # Steps
    ///
    /// 1. Resolve the extension (Content-Type first, then URL path); skip if none
    /// 2. Hash the bytes; skip if the hash was already recorded
    /// 3. Record the hash, then write `<basename>_<hash><ext>`
    ///
    /// # Returns
    ///
    /// * `Ok(DownloadOutcome)` - Written, or skipped for a non-error reason
    /// * `Err(SpiderError::Write)` - The file could not be written
    pub async fn download(
        &self,
        image_url: &Url,
        fetched: &FetchResult,
        state: &mut CrawlState,
    ) -> crate::Result<DownloadOutcome> {
        let Some(extension) = resolve_extension(image_url, fetched.content_type()) else {
            tracing::debug!("No image extension for {}, skipping", image_url);
            return Ok(DownloadOutcome::UnsupportedType);
        };

        let hash = content_hash(&fetched.body);
        if !state.record_content_hash(&hash) {
            tracing::debug!("Duplicate content {} from {}, skipping", hash, image_url);
            return Ok(DownloadOutcome::DuplicateContent { content_hash: hash });
        }

        let local_path = self
            .output_dir
            .join(build_filename(image_url, &hash, extension));

        tokio::fs::write(&local_path, &fetched.body)
            .await
            .map_err(|source| SpiderError::Write {
                path: local_path.display().to_string(),
                source,
            })?;

        Ok(DownloadOutcome::Written(DownloadedFile {
            source_url: image_url.clone(),
            content_hash: hash,
            local_path,
        }))
    }
}

/// Picks the file extension for an image
///
/// The Content-Type header wins when it names a known image type; otherwise the
/// URL path must end in an allowed extension, which is kept as-is.
pub fn resolve_extension(url: &Url, content_type: Option<&str>) -> Option<&'static str> {
    let content_type = content_type.unwrap_or_default().to_lowercase();

    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| content_type.contains(mime))
        .map(|(_, ext)| *ext)
        .or_else(|| allowed_extension_of(url))
}

/// First `HASH_PREFIX_LEN` hex characters of the SHA-256 digest of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_PREFIX_LEN);
    hash
}

/// Reduces a name to `[A-Za-z0-9._-]`
///
/// Each run of other characters becomes one underscore, leading and trailing
/// dots and underscores are trimmed, and an empty result becomes `file`.
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            sanitized.push(c);
            in_run = false;
        } else if !in_run {
            sanitized.push('_');
            in_run = true;
        }
    }

    let trimmed = sanitized.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds `<sanitized-basename-without-extension>_<hash><extension>`
pub fn build_filename(url: &Url, hash: &str, extension: &str) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("image");

    let sanitized = sanitize_filename(basename);
    let stem = Path::new(&sanitized)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(FALLBACK_NAME);

    format!("{}_{}{}", stem, hash, extension)
}

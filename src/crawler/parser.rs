//! HTML extraction of image candidates and page links
//!
//! Extraction is pure: it sees one document and its base URL, nothing about
//! crawl depth or what has already been downloaded.

use crate::url::{is_fetchable_scheme, normalize};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// File extensions treated as downloadable images
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp"];

/// Attributes carrying a single image URL (direct source, lazy-load and zoom variants)
const IMAGE_ATTRIBUTES: &[&str] = &[
    "src",
    "data-src",
    "data-original",
    "data-lazy-src",
    "data-zoom-image",
];

/// Attributes carrying a comma-separated list of `url descriptor` entries
const SRCSET_ATTRIBUTES: &[&str] = &["srcset", "data-srcset"];

/// `<link rel>` values followed as page links
const FOLLOWED_RELATIONS: &[&str] = &["next", "prev", "canonical"];

/// Absolute image URLs anywhere in the raw text, optionally with a query string
#[allow(clippy::expect_used)]
static EMBEDDED_IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>\\]+?\.(?:png|jpe?g|gif|bmp)(?:\?[^\s"'<>\\]*)?"#)
        .expect("embedded image regex is valid")
});

/// Insertion-ordered set of URLs
#[derive(Default)]
struct Candidates {
    seen: HashSet<String>,
    urls: Vec<Url>,
}

impl Candidates {
    fn push(&mut self, url: Url) {
        if self.seen.insert(url.as_str().to_string()) {
            self.urls.push(url);
        }
    }

    fn into_vec(self) -> Vec<Url> {
        self.urls
    }
}

/// Extracts the image candidates of a document
///
/// # Sources
///
/// 1. Image-bearing attributes (`src`, `data-src`, `data-original`,
///    `data-lazy-src`, `data-zoom-image`) on any element
/// 2. `srcset` entries (first token of each comma-separated entry)
/// 3. Every anchor `href` (anchors may link straight to an image)
/// 4. A textual scan of the raw document for absolute image URLs, which catches
///    URLs inside inline scripts and JSON blobs
///
/// All candidates are normalized against `base_url` and kept only if their path
/// ends in an allowed extension. The result has no duplicates and keeps
/// discovery order.
///
/// # Example
///
/// ```
/// use arachnida::crawler::extract_images;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/gallery/").unwrap();
/// let html = r#"<img src="a.jpg"><a href="/about.html">About</a>"#;
/// let images = extract_images(&base, html);
/// assert_eq!(images.len(), 1);
/// assert_eq!(images[0].as_str(), "https://example.com/gallery/a.jpg");
/// ```
pub fn extract_images(base_url: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut candidates = Candidates::default();

    for url in attribute_images(&document, base_url)
        .into_iter()
        .chain(srcset_images(&document, base_url))
        .chain(anchor_links(&document, base_url))
        .chain(scan_embedded_images(base_url, html))
    {
        if is_image_candidate(&url) {
            candidates.push(url);
        }
    }

    candidates.into_vec()
}

/// Extracts the page links of a document
///
/// Collects every anchor `href` and the target of each `<link>` whose `rel`
/// contains `next`, `prev` or `canonical` (case-insensitive), normalized against
/// `base_url`. The result has no duplicates and keeps discovery order.
pub fn extract_links(base_url: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Candidates::default();

    for url in anchor_links(&document, base_url) {
        links.push(url);
    }

    if let Ok(link_selector) = Selector::parse("link[rel][href]") {
        for element in document.select(&link_selector) {
            let followed = element
                .value()
                .attr("rel")
                .map(has_followed_relation)
                .unwrap_or(false);
            if !followed {
                continue;
            }

            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| normalize(base_url, href))
            {
                links.push(url);
            }
        }
    }

    links.into_vec()
}

/// Checks whether a URL path ends in one of the allowed image extensions
pub fn has_allowed_extension(url: &Url) -> bool {
    allowed_extension_of(url).is_some()
}

/// The allow-listed extension the URL path ends with, if any
pub fn allowed_extension_of(url: &Url) -> Option<&'static str> {
    let path = url.path().to_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| path.ends_with(ext))
}

fn is_image_candidate(url: &Url) -> bool {
    is_fetchable_scheme(url) && has_allowed_extension(url)
}

/// Values of the single-URL image attributes on any element
fn attribute_images(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut urls = Vec::new();

    for &attribute in IMAGE_ATTRIBUTES {
        let css = format!("[{}]", attribute);
        let Ok(selector) = Selector::parse(&css) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(url) = element
                .value()
                .attr(attribute)
                .and_then(|value| normalize(base_url, value))
            {
                urls.push(url);
            }
        }
    }

    urls
}

/// First token of every `srcset` entry
fn srcset_images(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut urls = Vec::new();

    for &attribute in SRCSET_ATTRIBUTES {
        let css = format!("[{}]", attribute);
        let Ok(selector) = Selector::parse(&css) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(srcset) = element.value().attr(attribute) {
                urls.extend(parse_srcset(base_url, srcset));
            }
        }
    }

    urls
}

/// Splits a `srcset` value into normalized URLs, ignoring width/density descriptors
pub fn parse_srcset(base_url: &Url, srcset: &str) -> Vec<Url> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .filter_map(|token| normalize(base_url, token))
        .collect()
}

/// Every navigable anchor reference
fn anchor_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut urls = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(url) = element
                .value()
                .attr("href")
                .and_then(|href| normalize(base_url, href))
            {
                urls.push(url);
            }
        }
    }

    urls
}

/// Textual scan of the raw document for absolute image URLs
///
/// This runs on the raw markup rather than the DOM, so it sees URLs no attribute
/// carries (inline scripts, JSON state blobs, CSS).
pub fn scan_embedded_images(base_url: &Url, html: &str) -> Vec<Url> {
    EMBEDDED_IMAGE_PATTERN
        .find_iter(html)
        .filter_map(|m| normalize(base_url, m.as_str()))
        .collect()
}

fn has_followed_relation(rel: &str) -> bool {
    rel.split_whitespace().any(|token| {
        FOLLOWED_RELATIONS
            .iter()
            .any(|relation| token.eq_ignore_ascii_case(relation))
    })
}

//! Integration tests for the spider
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, extract and download cycle end-to-end into a temporary directory.

use arachnida::config::{Config, CrawlerConfig, FetchConfig};
use arachnida::crawler::{
    content_hash, run_crawl, Coordinator, DirectFetcher, FetchLayer, FetchRequest, FetchResult,
    Fetcher,
};
use arachnida::url::parse_start_url;
use arachnida::{FetchError, UrlError};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake png payload";
const GIF_BYTES: &[u8] = b"GIF89a fake gif payload";

/// Creates a test configuration writing into `output_dir` with no politeness delay
fn create_test_config(output_dir: &Path, recursive: bool, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            recursive,
            max_depth,
            output_dir: output_dir.to_path_buf(),
        },
        fetch: FetchConfig {
            timeout_secs: 5,
            delay_ms: 0,
            ..FetchConfig::default()
        },
    }
}

fn start_url(server: &MockServer) -> Url {
    parse_start_url(&format!("{}/", server.uri())).unwrap()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

fn image(bytes: &[u8], mime: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(bytes.to_vec(), mime)
}

fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Fallback backend that answers every request with a canned outcome
struct StubFallback {
    body: Option<&'static [u8]>,
    calls: Arc<AtomicUsize>,
}

impl StubFallback {
    fn new(body: Option<&'static [u8]>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                body,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl Fetcher for StubFallback {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch(&self, _request: &FetchRequest<'_>) -> Result<FetchResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.body {
            Some(body) => Ok(FetchResult {
                status: Some(200),
                body: body.to_vec(),
                ..FetchResult::default()
            }),
            None => Err(FetchError::Fallback("stub refused".to_string())),
        }
    }
}

fn coordinator_with_stub(config: Config, start: Url, stub: StubFallback) -> Coordinator {
    let primary = DirectFetcher::from_config(&config.fetch).unwrap();
    let timeout = config.fetch.timeout();
    let layer = FetchLayer::new(Box::new(primary), Some(Box::new(stub)), timeout);
    Coordinator::with_fetch_layer(config, start, layer)
}

#[tokio::test]
async fn test_single_page_without_recursion() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <img src="/img/a.png">
            <a href="/gallery.html">Gallery</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gallery.html"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.images_downloaded, 1);

    let files = stored_files(output.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("a_"));
    assert!(files[0].ends_with(".png"));
    assert_eq!(
        std::fs::read(output.path().join(&files[0])).unwrap(),
        PNG_BYTES
    );
}

#[tokio::test]
async fn test_repeated_image_url_fetched_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <img src="/img/a.png">
            <img src="img/a.png#zoom">
            <a href="/img/a.png">full size</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.images_attempted, 1);
    assert_eq!(stored_files(output.path()).len(), 1);
}

#[tokio::test]
async fn test_identical_bytes_stored_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <img src="/img/a.png">
            <img src="/mirror/b.png">
            <img src="/img/c.gif">
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mirror/b.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/c.gif"))
        .respond_with(image(GIF_BYTES, "image/gif"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.images_downloaded, 2);
    assert_eq!(stats.duplicates_skipped, 1);

    let files = stored_files(output.path());
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.starts_with("a_") && f.ends_with(".png")));
    assert!(files.iter().any(|f| f.starts_with("c_") && f.ends_with(".gif")));
}

#[tokio::test]
async fn test_images_requested_with_page_referer() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let start = start_url(&mock_server);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<img src="/img/a.png">"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .and(header("referer", start.as_str()))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start).await.unwrap();

    assert_eq!(stats.images_downloaded, 1);
}

#[tokio::test]
async fn test_unsupported_and_missing_images_skipped() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <img src="/img/logo.svg">
            <img src="/img/gone.png">
            <img src="/img/ok.png">
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/logo.svg"))
        .respond_with(image(b"<svg/>", "image/svg+xml"))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/ok.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.images_failed, 1);
    assert_eq!(stats.images_downloaded, 1);
    assert_eq!(stored_files(output.path()).len(), 1);
}

#[tokio::test]
async fn test_recursion_respects_depth_and_host() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <a href="/a.html">A</a>
            <a href="http://other.invalid/page.html">Elsewhere</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a.html"))
        .respond_with(html(
            r#"<html><body>
            <img src="/img/a.png">
            <a href="/b.html">B</a>
            <a href="/">Home</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b.html"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), true, 1);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.images_downloaded, 1);
}

#[tokio::test]
async fn test_failed_page_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/broken.html">Broken</a>
            <a href="/ok.html">Ok</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok.html"))
        .respond_with(html(r#"<img src="/img/a.png">"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), true, 2);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.images_downloaded, 1);
}

#[tokio::test]
async fn test_blocked_image_recovered_by_fallback() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<img src="/img/blocked.png">"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/blocked.png"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (stub, calls) = StubFallback::new(Some(PNG_BYTES));
    let config = create_test_config(output.path(), false, 5);
    let coordinator = coordinator_with_stub(config, start_url(&mock_server), stub);
    let stats = coordinator.run().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.images_downloaded, 1);

    // The fallback surfaces no headers, so the extension comes from the path
    let files = stored_files(output.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("blocked_"));
    assert!(files[0].ends_with(".png"));
}

#[tokio::test]
async fn test_failed_fallback_skips_image_only() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<img src="/img/limited.png"><img src="/img/ok.gif">"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/limited.png"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/ok.gif"))
        .respond_with(image(GIF_BYTES, "image/gif"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (stub, calls) = StubFallback::new(None);
    let config = create_test_config(output.path(), false, 5);
    let coordinator = coordinator_with_stub(config, start_url(&mock_server), stub);
    let stats = coordinator.run().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.images_failed, 1);
    assert_eq!(stats.images_downloaded, 1);
}

#[tokio::test]
async fn test_not_found_does_not_use_fallback() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (stub, calls) = StubFallback::new(Some(b"<html></html>"));
    let config = create_test_config(output.path(), false, 5);
    let coordinator = coordinator_with_stub(config, start_url(&mock_server), stub);
    let stats = coordinator.run().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(stats.pages_failed, 1);
    assert!(stored_files(output.path()).is_empty());
}

#[tokio::test]
async fn test_output_directory_created() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let nested = output.path().join("nested").join("images");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body>No images here</body></html>"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&nested, false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert!(nested.is_dir());
    assert_eq!(stats.images_downloaded, 0);
    assert_eq!(stats.output_dir, nested.canonicalize().unwrap());
}

#[tokio::test]
async fn test_linked_image_not_crawled_as_page() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <img src="/img/a.png">
            <a href="/img/a.png">full size</a>
            <a href="/about.html">About</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about.html"))
        .respond_with(html("<html><body>About</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), true, 2);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.images_attempted, 1);
    assert_eq!(stats.images_downloaded, 1);
}

#[tokio::test]
async fn test_delay_after_page_and_each_image() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let delay = Duration::from_millis(50);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<img src="/img/a.png"><img src="/img/gone.png">"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(output.path(), false, 5);
    config.fetch.delay_ms = delay.as_millis() as u64;

    let started = Instant::now();
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(stats.images_attempted, 2);
    assert_eq!(stats.images_failed, 1);
    // One pause after the page fetch and one after each image attempt
    assert!(elapsed >= delay * 3, "crawl took only {:?}", elapsed);
    assert!(stats.elapsed >= delay * 3);
}

#[tokio::test]
async fn test_undecodable_page_still_extracted() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let mut body = b"<html><body>\xff\xfe broken \xc3(".to_vec();
    body.extend_from_slice(br#"<img src="/img/a.png"></body></html>"#);
    assert!(std::str::from_utf8(&body).is_err());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.images_downloaded, 1);
    assert_eq!(stored_files(output.path()).len(), 1);
}

#[tokio::test]
async fn test_write_failure_does_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // A directory already occupies the file name the first image would get
    let blocked = format!("a_{}.png", content_hash(PNG_BYTES));
    std::fs::create_dir(output.path().join(&blocked)).unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<img src="/img/a.png"><img src="/img/c.gif">"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(image(PNG_BYTES, "image/png"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/c.gif"))
        .respond_with(image(GIF_BYTES, "image/gif"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), false, 5);
    let stats = run_crawl(config, start_url(&mock_server)).await.unwrap();

    assert_eq!(stats.write_failures, 1);
    assert_eq!(stats.images_downloaded, 1);

    assert!(output.path().join(&blocked).is_dir());
    let written = format!("c_{}.gif", content_hash(GIF_BYTES));
    assert_eq!(
        std::fs::read(output.path().join(written)).unwrap(),
        GIF_BYTES
    );
}

#[test]
fn test_non_http_start_url_rejected() {
    assert!(matches!(
        parse_start_url("ftp://example.com/images"),
        Err(UrlError::InvalidScheme(_))
    ));
    assert!(parse_start_url("example.com").is_err());
}

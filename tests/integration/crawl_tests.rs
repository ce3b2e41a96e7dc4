//! Integration tests for the crawl engine
//!
//! These run the full pipeline - filter, cache, rate limiting, retries,
//! adapter extraction - against wiremock HTTP servers, plus a probe fetcher
//! where the property under test needs visibility the network cannot give.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sumi_tide::concurrency::OptimizationLevel;
use sumi_tide::config::load_config;
use sumi_tide::crawler::{CrawlEngine, FetchError, FetchedPage, Fetcher};
use sumi_tide::model::ContentType;
use sumi_tide::{CrawlRequest, CrawlerConfig, SiteConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Engine configuration tuned for tests: fixed concurrency, a generous
/// rate limit, and near-instant retry backoff
fn test_config() -> CrawlerConfig {
    let mut config = CrawlerConfig::default();
    config.optimization = OptimizationLevel::None;
    config.rate_limit = 1000.0;
    config.retry.base_delay_secs = 0.01;
    config.retry.jitter = 0.0;
    config
}

fn engine() -> CrawlEngine {
    CrawlEngine::new(test_config()).unwrap()
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cache_miss_then_hit() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "<html><title>A</title></html>", 1).await;

    let engine = engine();
    let url = format!("{}/a", server.uri());

    let first = engine.crawl_urls(vec![url.clone()]).await;
    let result = &first.results[0];
    assert!(result.status.is_success());
    assert!(!result.cached);

    let second = engine.crawl_urls(vec![url]).await;
    let hit = &second.results[0];
    assert!(hit.status.is_success());
    assert!(hit.cached);
    assert_eq!(hit.content, result.content);
    assert_eq!(hit.response_time, Duration::ZERO);

    // expect(1) on the mock verifies no second fetch happened
    server.verify().await;
}

#[tokio::test]
async fn test_blocked_extension_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine();
    let batch = engine
        .crawl_urls(vec![format!("{}/image.jpg", server.uri())])
        .await;

    let result = &batch.results[0];
    assert!(result.status.is_skipped());
    assert!(result.error.as_deref().unwrap().contains(".jpg"));
    assert_eq!(batch.summary.skipped, 1);
    server.verify().await;
}

#[tokio::test]
async fn test_timeout_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let engine = engine();
    let request = CrawlRequest::new(format!("{}/slow", server.uri()))
        .with_timeout(Duration::from_millis(200))
        .with_max_retries(2);

    let batch = engine.crawl(vec![request]).await;
    let result = &batch.results[0];
    assert!(result.status.is_failure());
    assert_eq!(result.retry_count, 2);
    assert_eq!(batch.stats.retried_requests, 2);

    // expect(3): the initial fetch plus exactly two retries
    server.verify().await;
}

#[tokio::test]
async fn test_http_error_fails_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine();
    let request = CrawlRequest::new(format!("{}/gone", server.uri())).with_max_retries(5);
    let batch = engine.crawl(vec![request]).await;

    let result = &batch.results[0];
    assert!(result.status.is_failure());
    assert_eq!(result.status_code, Some(404));
    assert_eq!(result.retry_count, 0);
    server.verify().await;
}

#[tokio::test]
async fn test_fallback_extraction_for_unconfigured_sites() {
    let server = MockServer::start().await;
    let hash = "aabbccddeeff00112233445566778899aabbccdd";
    let body = format!(
        r#"<html><head><title>Listing</title></head><body>
<a href="/one">1</a>
<a href="magnet:?xt=urn:btih:{}">dl</a>
</body></html>"#,
        hash
    );
    mount_page(&server, "/page", &body, 1).await;

    let engine = engine();
    let batch = engine
        .crawl_urls(vec![format!("{}/page", server.uri())])
        .await;

    let parsed = batch.results[0].parsed.as_ref().unwrap();
    assert!(parsed.adapter_used.is_none(), "no site config matched");
    assert_eq!(
        parsed.field("title").and_then(|f| f.as_text()),
        Some("Listing")
    );
    let links = parsed.field("links").and_then(|f| f.as_list()).unwrap();
    assert_eq!(links.len(), 2);
    let magnets = parsed
        .field("magnet_links")
        .and_then(|f| f.as_list())
        .unwrap();
    assert_eq!(magnets.len(), 1);
}

#[tokio::test]
async fn test_configured_adapter_claims_matching_urls() {
    let server = MockServer::start().await;
    mount_page(&server, "/t", "<title>claimed</title>", 1).await;

    let mut config = test_config();
    let mut site = SiteConfig::new("mock-site", format!("{}/*", server.uri()));
    site.adapter = Some("generic".to_string());
    config.sites = vec![site];

    let engine = CrawlEngine::new(config).unwrap();
    let batch = engine.crawl_urls(vec![format!("{}/t", server.uri())]).await;

    let parsed = batch.results[0].parsed.as_ref().unwrap();
    assert_eq!(parsed.adapter_used.as_deref(), Some("mock-site"));
}

#[tokio::test]
async fn test_crawl_magnets_returns_deduped_uris() {
    let server = MockServer::start().await;
    let hash = "aabbccddeeff00112233445566778899aabbccdd";
    mount_page(
        &server,
        "/m1",
        &format!(
            "magnet:?xt=urn:btih:{} and magnet:?xt=urn:btih:{}",
            hash,
            hash.to_uppercase()
        ),
        1,
    )
    .await;
    mount_page(&server, "/m2", "no magnets here", 1).await;

    let engine = engine();
    let magnets = engine
        .crawl_magnets(vec![
            format!("{}/m1", server.uri()),
            format!("{}/m2", server.uri()),
        ])
        .await;

    assert_eq!(magnets.len(), 1, "case-insensitive dedupe by info hash");
    assert!(magnets[0].starts_with("magnet:?"));
}

#[tokio::test]
async fn test_mixed_batch_summary() {
    let server = MockServer::start().await;
    mount_page(&server, "/ok", "<title>ok</title>", 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = engine();
    let batch = engine
        .crawl_urls(vec![
            format!("{}/ok", server.uri()),
            format!("{}/missing", server.uri()),
            format!("{}/style.css", server.uri()),
        ])
        .await;

    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.successful, 1);
    assert_eq!(batch.summary.failed, 1);
    assert_eq!(batch.summary.skipped, 1);
    assert_eq!(batch.summary.cached, 0);
}

/// Fetcher that tracks how many fetches run at once
struct ProbeFetcher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ProbeFetcher {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetcher for ProbeFetcher {
    async fn fetch(&self, _request: &CrawlRequest) -> Result<FetchedPage, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(FetchedPage {
            status_code: 200,
            body: "<html>probe</html>".to_string(),
            content_type: ContentType::Html,
        })
    }
}

#[tokio::test]
async fn test_concurrency_never_exceeds_the_gate() {
    let mut config = test_config();
    config.max_concurrent = 3;

    let probe = Arc::new(ProbeFetcher::new());
    let shared = Arc::clone(&probe) as Arc<dyn Fetcher>;
    let engine = CrawlEngine::with_fetcher(config, shared).unwrap();

    let urls = (0..12)
        .map(|i| format!("https://example.com/page-{}", i))
        .collect();
    let batch = engine.crawl_urls(urls).await;

    assert_eq!(batch.summary.successful, 12);
    assert!(
        probe.peak.load(Ordering::SeqCst) <= 3,
        "peak in-flight {} exceeded the gate",
        probe.peak.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_rate_limit_spreads_a_burst() {
    let mut config = test_config();
    config.rate_limit = 2.0;

    let probe = Arc::new(ProbeFetcher::new());
    let shared = Arc::clone(&probe) as Arc<dyn Fetcher>;
    let engine = CrawlEngine::with_fetcher(config, shared).unwrap();

    let urls = (0..3)
        .map(|i| format!("https://example.com/burst-{}", i))
        .collect();
    let started = Instant::now();
    let batch = engine.crawl_urls(urls).await;

    assert_eq!(batch.summary.successful, 3);
    // Two admissions fit the first window; the third waits for it to roll
    assert!(
        started.elapsed() >= Duration::from_millis(800),
        "third request was admitted inside the first window"
    );
}

#[tokio::test]
async fn test_engine_from_config_file() {
    let toml = r#"
max-concurrent = 4
rate-limit = 50.0
optimization = "moderate"
blocked-hosts = ["ads.example"]

[retry]
max-attempts = 2
base-delay-secs = 0.01

[[site]]
name = "tracker"
url-pattern = "*://tracker.example/*"
adapter = "torrent"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, toml.as_bytes()).unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.max_concurrent, 4);
    assert_eq!(config.sites.len(), 1);

    let engine = CrawlEngine::new(config).unwrap();
    let batch = engine
        .crawl_urls(vec!["https://ads.example/banner".to_string()])
        .await;
    assert!(batch.results[0].status.is_skipped());
}

#[tokio::test]
async fn test_start_stop_lifecycle() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "<title>up</title>", 1).await;

    let mut config = test_config();
    config.optimization = OptimizationLevel::Moderate;
    let engine = CrawlEngine::new(config).unwrap();

    engine.start();
    let batch = engine.crawl_urls(vec![format!("{}/a", server.uri())]).await;
    assert_eq!(batch.summary.successful, 1);
    engine.stop();

    let stats = engine.get_stats();
    assert_eq!(stats.crawler.total_requests, 1);
    assert!(stats.crawler.finished_at.is_some());
}

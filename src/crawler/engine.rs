//! Crawl engine - batch orchestration
//!
//! `CrawlEngine` composes the cache, resilience manager, stats collector,
//! adapter parser, and concurrency controller into one bounded-concurrency
//! pipeline. Per request the order is fixed: filter, cache lookup, gate
//! slot, rate-limit admission, fetch with retries, extraction, cache
//! write-through, stats recording. Across requests nothing is ordered;
//! results come back as they complete.

use crate::adapters::{AdapterFactory, AdaptiveParser};
use crate::cache::{CacheStats, ResponseCache};
use crate::concurrency::{ConcurrencyController, ControllerStats};
use crate::config::{validate, CrawlerConfig, SiteConfig};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher, HttpFetcher};
use crate::crawler::filter::UrlFilter;
use crate::magnet::extract_magnets;
use crate::model::{
    BatchResult, BatchSummary, CrawlRequest, CrawlResult, CrawlStatus, FetchOutcome,
};
use crate::resilience::{ResilienceManager, ResilienceStats, RetryPolicy};
use crate::stats::{CrawlerStats, StatsCollector};
use crate::TideError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Pause between admission attempts when the rate limiter is full
const ADMISSION_POLL: Duration = Duration::from_millis(100);

/// Point-in-time view across every subsystem
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub crawler: CrawlerStats,
    pub controller: ControllerStats,
    pub cache: CacheStats,
    pub resilience: ResilienceStats,
}

/// The state shared between the engine handle and its request tasks
struct EngineInner {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<ResponseCache>,
    resilience: ResilienceManager,
    stats: StatsCollector,
    controller: Arc<ConcurrencyController>,
    parser: AdaptiveParser,
    filter: UrlFilter,
    default_timeout: Duration,
    default_max_retries: u32,
}

/// Adaptive crawl engine
pub struct CrawlEngine {
    inner: Arc<EngineInner>,
    shutdown_tx: watch::Sender<bool>,
}

impl CrawlEngine {
    /// Builds an engine with the production HTTP fetcher.
    ///
    /// Configuration problems - out-of-range limits, bad URL patterns, bad
    /// selectors - surface here, before anything is crawled.
    pub fn new(config: CrawlerConfig) -> Result<Self, TideError> {
        let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Builds an engine around a caller-supplied fetcher
    pub fn with_fetcher(
        config: CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, TideError> {
        validate(&config)?;

        let policy = RetryPolicy {
            max_attempts: config.retry.max_attempts,
            base_delay: Duration::from_secs_f64(config.retry.base_delay_secs),
            max_delay: Duration::from_secs_f64(config.retry.max_delay_secs),
            exponential_base: config.retry.exponential_base,
            jitter: config.retry.jitter,
        };
        let resilience =
            ResilienceManager::new(config.rate_limit, config.default_max_retries).with_policy(policy);

        let cache = Arc::new(ResponseCache::new(
            config.cache_max_entries,
            Duration::from_secs(config.cache_ttl_secs),
        ));

        let controller = Arc::new(ConcurrencyController::new(
            config.optimization,
            config.max_concurrent,
            config.memory_limit_mb,
        ));
        let purge_target = Arc::clone(&cache);
        controller.on_memory_pressure(move || {
            purge_target.purge_expired();
        });

        let parser = AdaptiveParser::new(&config.sites, AdapterFactory::new())?;
        let filter = UrlFilter::new(&config.blocked_hosts, &config.blocked_extensions);

        let (shutdown_tx, _) = watch::channel(false);
        tracing::info!(
            "Engine ready: {} site(s), max concurrency {}, {} optimization",
            config.sites.len(),
            config.max_concurrent,
            config.optimization
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                fetcher,
                cache,
                resilience,
                stats: StatsCollector::new(),
                controller,
                parser,
                filter,
                default_timeout: Duration::from_secs(config.default_timeout_secs),
                default_max_retries: config.default_max_retries,
            }),
            shutdown_tx,
        })
    }

    /// Starts the background concurrency-adjustment task
    pub fn start(&self) {
        self.inner.controller.start();
    }

    /// Stops the adjustment task, then signals in-flight batches to abort.
    ///
    /// The timer goes first so a last-moment resize cannot race the
    /// shutdown; partially completed requests are discarded.
    pub fn stop(&self) {
        self.inner.controller.stop();
        let _ = self.shutdown_tx.send(true);
        self.inner.stats.mark_finished();
    }

    /// Registers a site while the engine is live
    pub fn add_site(&self, config: &SiteConfig) -> Result<(), TideError> {
        self.inner.parser.add_site(config)
    }

    /// Crawls a batch of requests concurrently.
    ///
    /// Results arrive in completion order, not input order. A panicking
    /// request task becomes a `Failed` result; nothing aborts the batch
    /// except `stop()`.
    pub async fn crawl(&self, requests: Vec<CrawlRequest>) -> BatchResult {
        let total = requests.len();
        tracing::info!("Crawling batch of {} request(s)", total);

        let mut tasks = JoinSet::new();
        let mut task_urls = HashMap::new();
        for request in requests {
            let inner = Arc::clone(&self.inner);
            let url = request.url.clone();
            let handle = tasks.spawn(async move { inner.process(request).await });
            task_urls.insert(handle.id(), url);
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut results = Vec::with_capacity(total);
        loop {
            tokio::select! {
                joined = tasks.join_next_with_id() => match joined {
                    Some(Ok((_, result))) => results.push(result),
                    Some(Err(join_error)) => {
                        let url = task_urls
                            .get(&join_error.id())
                            .cloned()
                            .unwrap_or_default();
                        tracing::error!(%url, "Request task failed: {}", join_error);
                        self.inner.stats.record(false, Duration::ZERO, false);
                        results.push(CrawlResult::failed(
                            url,
                            format!("Task failure: {}", join_error),
                        ));
                    }
                    None => break,
                },
                _ = shutdown_rx.changed() => {
                    tracing::warn!(
                        "Engine stopped mid-batch, discarding {} in-flight request(s)",
                        total - results.len()
                    );
                    tasks.abort_all();
                    while tasks.join_next().await.is_some() {}
                    break;
                }
            }
        }

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            "Batch complete: {} ok, {} failed, {} skipped, {} cached",
            summary.successful,
            summary.failed,
            summary.skipped,
            summary.cached
        );

        BatchResult {
            summary,
            results,
            stats: self.inner.stats.snapshot(),
        }
    }

    /// Crawls plain URLs as GET requests with the configured defaults
    pub async fn crawl_urls(&self, urls: Vec<String>) -> BatchResult {
        let requests = urls
            .into_iter()
            .map(|url| {
                CrawlRequest::new(url)
                    .with_timeout(self.inner.default_timeout)
                    .with_max_retries(self.inner.default_max_retries)
            })
            .collect();
        self.crawl(requests).await
    }

    /// Crawls URLs and harvests magnet URIs from the successful results,
    /// deduplicated by info hash across the whole batch
    pub async fn crawl_magnets(&self, urls: Vec<String>) -> Vec<String> {
        let batch = self.crawl_urls(urls).await;

        let mut seen = HashSet::new();
        let mut magnets = Vec::new();
        for result in &batch.results {
            if !result.status.is_success() {
                continue;
            }
            let Some(content) = &result.content else {
                continue;
            };
            for link in extract_magnets(content) {
                if seen.insert(link.info_hash) {
                    magnets.push(link.uri);
                }
            }
        }
        tracing::info!("Harvested {} magnet link(s)", magnets.len());
        magnets
    }

    /// Snapshot of every subsystem's statistics
    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            crawler: self.inner.stats.snapshot(),
            controller: self.inner.controller.stats(),
            cache: self.inner.cache.stats(),
            resilience: self.inner.resilience.stats(),
        }
    }

    /// Clears the cumulative crawl counters
    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }
}

impl EngineInner {
    /// Runs one request through the whole pipeline. Never panics the batch:
    /// every outcome becomes a `CrawlResult`.
    async fn process(&self, request: CrawlRequest) -> CrawlResult {
        // Pre-fetch filter: skips consume no gate slot and no rate token
        if let Some(reason) = self.filter.check(&request.url) {
            let status =
                CrawlStatus::Pending.advance(FetchOutcome::Filtered, 0, request.max_retries);
            tracing::debug!(url = %request.url, "Skipped: {}", reason.describe());
            let mut result = CrawlResult::skipped(&request.url, reason.describe());
            result.status = status;
            result.metadata = request.metadata;
            return result;
        }

        // Cache hit short-circuits with zero measured latency
        if let Some((content, content_type)) = self.cache.get(&request) {
            self.stats.record(true, Duration::ZERO, true);
            let parsed = self.parser.parse(&request.url, &content);
            let mut result = CrawlResult::success(&request.url, content);
            result.content_type = content_type;
            result.cached = true;
            result.parsed = Some(parsed);
            result.metadata = request.metadata;
            return result;
        }

        // One gate slot covers all attempts for this request
        let permit = match self.controller.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!(url = %request.url, "Gate closed, engine is shutting down");
                return CrawlResult::failed(&request.url, "Engine shut down");
            }
        };

        let mut status = CrawlStatus::Pending;
        let mut retries = 0u32;
        let started = Instant::now();

        let outcome = loop {
            // Dispatch: Pending and Retry move to InProgress on any
            // non-filtered outcome
            status = status.advance(FetchOutcome::Fetched, retries, request.max_retries);
            debug_assert_eq!(status, CrawlStatus::InProgress);

            let attempt = self.attempt_fetch(&request).await;
            match attempt {
                Ok(page) => {
                    status = status.advance(FetchOutcome::Fetched, retries, request.max_retries);
                    break Ok(page);
                }
                Err(error) => {
                    let fetch_outcome = if error.is_transient() {
                        FetchOutcome::TransientError
                    } else {
                        FetchOutcome::PermanentError
                    };
                    status = status.advance(fetch_outcome, retries, request.max_retries);
                    // The manager owns the retry decision; the status
                    // machine mirrors it
                    let retry = self
                        .resilience
                        .should_retry_with(retries, request.max_retries, &error);
                    debug_assert_eq!(retry, status == CrawlStatus::Retry);
                    if !retry {
                        break Err(error);
                    }

                    retries += 1;
                    self.stats.record_retry();
                    let delay = self.resilience.retry_policy().delay_for_attempt(retries);
                    tracing::debug!(
                        url = %request.url,
                        retry = retries,
                        "Transient failure ({}), backing off {:.2}s",
                        error,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };
        drop(permit);

        let response_time = started.elapsed();
        match outcome {
            Ok(page) => self.complete_success(request, page, status, retries, response_time),
            Err(error) => self.complete_failure(request, error, status, retries, response_time),
        }
    }

    /// Waits for rate-limit admission, then fetches once.
    ///
    /// An admission window that never opens within the request's timeout is
    /// reported as a timeout, which keeps it on the transient retry path.
    async fn attempt_fetch(&self, request: &CrawlRequest) -> Result<FetchedPage, FetchError> {
        let waiting_since = Instant::now();
        while !self.resilience.admit() {
            if waiting_since.elapsed() >= request.timeout {
                tracing::debug!(url = %request.url, "Admission wait exhausted the timeout");
                return Err(FetchError::Timeout);
            }
            tokio::time::sleep(ADMISSION_POLL).await;
        }
        self.fetcher.fetch(request).await
    }

    fn complete_success(
        &self,
        request: CrawlRequest,
        page: FetchedPage,
        status: CrawlStatus,
        retries: u32,
        response_time: Duration,
    ) -> CrawlResult {
        debug_assert!(status.is_success());
        self.cache.set(&request, &page.body, page.content_type);
        self.stats.record(true, response_time, false);
        self.stats.record_bytes(page.body.len() as u64);
        self.controller.record(response_time, false, false);

        let parsed = self.parser.parse(&request.url, &page.body);
        tracing::debug!(
            url = %request.url,
            status = page.status_code,
            bytes = page.body.len(),
            "Fetched in {:.2}s",
            response_time.as_secs_f64()
        );

        let mut result = CrawlResult::success(&request.url, page.body);
        result.status = status;
        result.status_code = Some(page.status_code);
        result.content_type = page.content_type;
        result.response_time = response_time;
        result.retry_count = retries;
        result.parsed = Some(parsed);
        result.metadata = request.metadata;
        result
    }

    fn complete_failure(
        &self,
        request: CrawlRequest,
        error: FetchError,
        status: CrawlStatus,
        retries: u32,
        response_time: Duration,
    ) -> CrawlResult {
        debug_assert!(status.is_failure());
        self.stats.record(false, response_time, false);
        self.controller
            .record(response_time, true, error.is_timeout());
        tracing::warn!(url = %request.url, retries, "Failed: {}", error);

        let mut result = CrawlResult::failed(&request.url, error.to_string());
        result.status = status;
        if let FetchError::Http(code) = error {
            result.status_code = Some(code);
        }
        result.response_time = response_time;
        result.retry_count = retries;
        result.metadata = request.metadata;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::OptimizationLevel;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fetcher that replays scripted outcomes and counts attempts per URL
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Result<String, FetchError>>>,
        attempts: AtomicU32,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                attempts: AtomicU32::new(0),
            }
        }

        fn succeed(self, url: &str, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Ok(body.to_string()));
            self
        }

        fn fail(self, url: &str, error: FetchError) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Err(error));
            self
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &CrawlRequest) -> Result<FetchedPage, FetchError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.responses.lock().unwrap().get(&request.url) {
                Some(Ok(body)) => Ok(FetchedPage {
                    status_code: 200,
                    body: body.clone(),
                    content_type: crate::model::ContentType::Html,
                }),
                Some(Err(error)) => Err(error.clone()),
                None => Err(FetchError::Http(404)),
            }
        }
    }

    /// Config tuned for tests: fixed concurrency, instant retries
    fn test_config() -> CrawlerConfig {
        let mut config = CrawlerConfig::default();
        config.optimization = OptimizationLevel::None;
        config.rate_limit = 1000.0;
        config.retry.base_delay_secs = 0.001;
        config.retry.jitter = 0.0;
        config
    }

    fn engine_with(fetcher: ScriptedFetcher) -> (CrawlEngine, Arc<ScriptedFetcher>) {
        let fetcher = Arc::new(fetcher);
        let shared = Arc::clone(&fetcher) as Arc<dyn Fetcher>;
        let engine = CrawlEngine::with_fetcher(test_config(), shared).unwrap();
        (engine, fetcher)
    }

    #[tokio::test]
    async fn test_successful_crawl_parses_and_records() {
        let (engine, _) = engine_with(
            ScriptedFetcher::new().succeed("https://example.com/a", "<title>Page A</title>"),
        );

        let batch = engine.crawl_urls(vec!["https://example.com/a".to_string()]).await;
        assert_eq!(batch.summary.successful, 1);

        let result = &batch.results[0];
        assert!(result.status.is_success());
        assert!(!result.cached);
        assert_eq!(result.status_code, Some(200));
        let parsed = result.parsed.as_ref().unwrap();
        assert!(parsed.adapter_used.is_none(), "no sites configured");
        assert_eq!(
            parsed.field("title").and_then(|f| f.as_text()),
            Some("Page A")
        );

        assert_eq!(batch.stats.total_requests, 1);
        assert_eq!(batch.stats.successful_requests, 1);
    }

    #[tokio::test]
    async fn test_cache_miss_then_hit() {
        let (engine, fetcher) = engine_with(
            ScriptedFetcher::new().succeed("https://example.com/a", "<title>cached</title>"),
        );
        let request = CrawlRequest::new("https://example.com/a");

        let first = engine.crawl(vec![request.clone()]).await;
        assert!(first.results[0].status.is_success());
        assert!(!first.results[0].cached);
        assert_eq!(fetcher.attempts(), 1);

        let second = engine.crawl(vec![request]).await;
        let hit = &second.results[0];
        assert!(hit.status.is_success());
        assert!(hit.cached);
        assert_eq!(hit.response_time, Duration::ZERO);
        assert_eq!(hit.content, first.results[0].content);
        assert_eq!(fetcher.attempts(), 1, "cache hit must not fetch");
        assert_eq!(second.stats.cached_requests, 1);
    }

    #[tokio::test]
    async fn test_blocked_extension_is_skipped_without_fetching() {
        let (engine, fetcher) = engine_with(ScriptedFetcher::new());

        let batch = engine
            .crawl_urls(vec!["https://example.com/image.jpg".to_string()])
            .await;
        let result = &batch.results[0];
        assert!(result.status.is_skipped());
        assert_eq!(batch.summary.skipped, 1);
        assert_eq!(fetcher.attempts(), 0);
        assert_eq!(
            batch.stats.total_requests, 0,
            "skips stay out of the counters"
        );
    }

    #[tokio::test]
    async fn test_blocked_host_is_skipped() {
        let mut config = test_config();
        config.blocked_hosts = vec!["tracker.example".to_string()];
        let fetcher = Arc::new(ScriptedFetcher::new());
        let shared = Arc::clone(&fetcher) as Arc<dyn Fetcher>;
        let engine = CrawlEngine::with_fetcher(config, shared).unwrap();

        let batch = engine
            .crawl_urls(vec!["https://tracker.example/page".to_string()])
            .await;
        assert!(batch.results[0].status.is_skipped());
        assert_eq!(fetcher.attempts(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_retries() {
        let (engine, fetcher) =
            engine_with(ScriptedFetcher::new().fail("https://example.com/slow", FetchError::Timeout));

        let request = CrawlRequest::new("https://example.com/slow").with_max_retries(2);
        let batch = engine.crawl(vec![request]).await;

        let result = &batch.results[0];
        assert!(result.status.is_failure());
        assert_eq!(result.retry_count, 2);
        assert_eq!(fetcher.attempts(), 3, "initial fetch plus two retries");
        assert_eq!(batch.stats.retried_requests, 2);
    }

    #[tokio::test]
    async fn test_zero_retry_budget_fails_on_first_transient() {
        let (engine, fetcher) = engine_with(ScriptedFetcher::new().fail(
            "https://example.com/flaky",
            FetchError::Connection("reset".to_string()),
        ));

        let request = CrawlRequest::new("https://example.com/flaky").with_max_retries(0);
        let batch = engine.crawl(vec![request]).await;

        let result = &batch.results[0];
        assert!(result.status.is_failure());
        assert_eq!(result.retry_count, 0);
        assert_eq!(fetcher.attempts(), 1, "no budget means no second attempt");
    }

    #[tokio::test]
    async fn test_permanent_error_never_retries() {
        let (engine, fetcher) =
            engine_with(ScriptedFetcher::new().fail("https://example.com/gone", FetchError::Http(404)));

        let request = CrawlRequest::new("https://example.com/gone").with_max_retries(5);
        let batch = engine.crawl(vec![request]).await;

        let result = &batch.results[0];
        assert!(result.status.is_failure());
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.retry_count, 0);
        assert_eq!(fetcher.attempts(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_the_batch() {
        let (engine, _) = engine_with(
            ScriptedFetcher::new()
                .succeed("https://example.com/ok", "<title>ok</title>")
                .fail("https://example.com/bad", FetchError::Http(500)),
        );

        let batch = engine
            .crawl_urls(vec![
                "https://example.com/ok".to_string(),
                "https://example.com/bad".to_string(),
            ])
            .await;
        assert_eq!(batch.summary.total, 2);
        assert_eq!(batch.summary.successful, 1);
        assert_eq!(batch.summary.failed, 1);
    }

    #[tokio::test]
    async fn test_crawl_magnets_dedupes_across_results() {
        let hash_a = "aabbccddeeff00112233445566778899aabbccdd";
        let hash_b = "0011223344556677889900112233445566778899";
        let (engine, _) = engine_with(
            ScriptedFetcher::new()
                .succeed(
                    "https://example.com/1",
                    &format!("magnet:?xt=urn:btih:{} magnet:?xt=urn:btih:{}", hash_a, hash_b),
                )
                .succeed(
                    "https://example.com/2",
                    &format!("magnet:?xt=urn:btih:{}", hash_a.to_uppercase()),
                ),
        );

        let magnets = engine
            .crawl_magnets(vec![
                "https://example.com/1".to_string(),
                "https://example.com/2".to_string(),
            ])
            .await;
        assert_eq!(magnets.len(), 2, "same info hash appears once");
    }

    #[tokio::test]
    async fn test_stats_reset() {
        let (engine, _) =
            engine_with(ScriptedFetcher::new().succeed("https://example.com/a", "<p>x</p>"));
        engine.crawl_urls(vec!["https://example.com/a".to_string()]).await;
        assert_eq!(engine.get_stats().crawler.total_requests, 1);

        engine.reset_stats();
        assert_eq!(engine.get_stats().crawler.total_requests, 0);
    }

    #[tokio::test]
    async fn test_get_stats_covers_every_subsystem() {
        let (engine, _) =
            engine_with(ScriptedFetcher::new().succeed("https://example.com/a", "<p>x</p>"));
        engine.crawl_urls(vec!["https://example.com/a".to_string()]).await;

        let stats = engine.get_stats();
        assert_eq!(stats.crawler.successful_requests, 1);
        assert_eq!(stats.controller.concurrency.max, 10);
        assert_eq!(stats.cache.entry_count, 1);
        assert!(stats.resilience.rate_limit > 0.0);
    }

    #[tokio::test]
    async fn test_configured_site_adapter_tags_results() {
        let mut config = test_config();
        let mut site = SiteConfig::new("example", "*://example.com/*");
        site.adapter = Some("generic".to_string());
        config.sites = vec![site];

        let fetcher: Arc<dyn Fetcher> =
            Arc::new(ScriptedFetcher::new().succeed("https://example.com/a", "<title>t</title>"));
        let engine = CrawlEngine::with_fetcher(config, fetcher).unwrap();

        let batch = engine.crawl_urls(vec!["https://example.com/a".to_string()]).await;
        let parsed = batch.results[0].parsed.as_ref().unwrap();
        assert_eq!(parsed.adapter_used.as_deref(), Some("example"));
    }

    #[tokio::test]
    async fn test_invalid_site_pattern_fails_construction() {
        let mut config = test_config();
        config.sites = vec![SiteConfig::new("broken", "regex:[unclosed")];
        let fetcher: Arc<dyn Fetcher> = Arc::new(ScriptedFetcher::new());
        assert!(CrawlEngine::with_fetcher(config, fetcher).is_err());
    }

    #[tokio::test]
    async fn test_stop_discards_inflight_requests() {
        /// Fetcher that blocks until the test is torn down
        struct StuckFetcher;

        #[async_trait::async_trait]
        impl Fetcher for StuckFetcher {
            async fn fetch(&self, _request: &CrawlRequest) -> Result<FetchedPage, FetchError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Timeout)
            }
        }

        let engine = Arc::new(
            CrawlEngine::with_fetcher(test_config(), Arc::new(StuckFetcher) as Arc<dyn Fetcher>)
                .unwrap(),
        );

        let crawler = Arc::clone(&engine);
        let batch = tokio::spawn(async move {
            crawler
                .crawl_urls(vec!["https://example.com/stuck".to_string()])
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.stop();

        let batch = tokio::time::timeout(Duration::from_secs(1), batch)
            .await
            .expect("stop must unblock the batch")
            .unwrap();
        assert!(batch.results.is_empty(), "in-flight work is discarded");
    }
}

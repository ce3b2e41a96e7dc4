/// Cumulative crawl statistics
///
/// Counters are atomics mutated from concurrent request tasks; `snapshot`
/// produces an immutable view with derived rates, guarded against
/// zero denominators. Reset is explicit, by the caller.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Point-in-time view of cumulative crawl statistics
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cached_requests: u64,
    pub retried_requests: u64,
    pub total_bytes: u64,

    /// Mean response time in seconds over all recorded requests
    pub average_response_time: f64,

    /// successful / total, 0 when no requests have been recorded
    pub success_rate: f64,

    /// cached / total, 0 when no requests have been recorded
    pub cache_hit_rate: f64,

    /// total / seconds since start (or until finish, once finished)
    pub requests_per_second: f64,

    /// bytes / seconds over the same interval
    pub average_throughput: f64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Collects counters from concurrent request tasks
pub struct StatsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    cached_requests: AtomicU64,
    retried_requests: AtomicU64,
    total_bytes: AtomicU64,
    total_response_micros: AtomicU64,
    timestamps: Mutex<(DateTime<Utc>, Option<DateTime<Utc>>)>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            cached_requests: AtomicU64::new(0),
            retried_requests: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            total_response_micros: AtomicU64::new(0),
            timestamps: Mutex::new((Utc::now(), None)),
        }
    }

    /// Records one completed request
    pub fn record(&self, success: bool, response_time: Duration, from_cache: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        if from_cache {
            self.cached_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_response_micros
            .fetch_add(response_time.as_micros() as u64, Ordering::Relaxed);
    }

    /// Adds downloaded payload bytes
    pub fn record_bytes(&self, bytes: u64) {
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Counts one retry attempt
    pub fn record_retry(&self) {
        self.retried_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks the end of the active interval used for throughput rates
    pub fn mark_finished(&self) {
        let mut timestamps = self.timestamps.lock().unwrap();
        timestamps.1 = Some(Utc::now());
    }

    /// Clears every counter and restarts the active interval
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.cached_requests.store(0, Ordering::Relaxed);
        self.retried_requests.store(0, Ordering::Relaxed);
        self.total_bytes.store(0, Ordering::Relaxed);
        self.total_response_micros.store(0, Ordering::Relaxed);
        let mut timestamps = self.timestamps.lock().unwrap();
        *timestamps = (Utc::now(), None);
    }

    /// Produces an immutable snapshot with derived rates
    pub fn snapshot(&self) -> CrawlerStats {
        let total = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let cached = self.cached_requests.load(Ordering::Relaxed);
        let retried = self.retried_requests.load(Ordering::Relaxed);
        let total_bytes = self.total_bytes.load(Ordering::Relaxed);
        let total_micros = self.total_response_micros.load(Ordering::Relaxed);

        let (started_at, finished_at) = *self.timestamps.lock().unwrap();

        let elapsed = finished_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;

        let average_response_time = if total == 0 {
            0.0
        } else {
            (total_micros as f64 / 1_000_000.0) / total as f64
        };
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64
        };
        let cache_hit_rate = if total == 0 {
            0.0
        } else {
            cached as f64 / total as f64
        };
        let requests_per_second = if elapsed > 0.0 {
            total as f64 / elapsed
        } else {
            0.0
        };
        let average_throughput = if elapsed > 0.0 {
            total_bytes as f64 / elapsed
        } else {
            0.0
        };

        CrawlerStats {
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            cached_requests: cached,
            retried_requests: retried,
            total_bytes,
            average_response_time,
            success_rate,
            cache_hit_rate,
            requests_per_second,
            average_throughput,
            started_at,
            finished_at,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

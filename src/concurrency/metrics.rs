/// Sliding performance window
///
/// Per-request samples land here and the controller periodically reduces
/// them to the metrics its scoring runs on. The window is bounded, so old
/// traffic ages out as new samples arrive.
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Samples kept in the sliding window
pub const WINDOW_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy)]
struct Sample {
    secs: f64,
    is_error: bool,
    is_timeout: bool,
}

/// Reduced view of the current window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub avg_response_time: f64,
    pub median_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    pub requests_per_second: f64,
    pub error_rate: f64,
    pub timeout_rate: f64,
    pub memory_usage_mb: f64,
    pub sample_count: usize,
}

/// Bounded window of recent request samples
pub struct SampleWindow {
    samples: Mutex<VecDeque<Sample>>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Records one finished request. Timeouts count as errors too.
    pub fn record(&self, response_time: Duration, is_error: bool, is_timeout: bool) {
        let mut samples = self.samples.lock().unwrap();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(Sample {
            secs: response_time.as_secs_f64(),
            is_error,
            is_timeout,
        });
    }

    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    /// Reduces the window to metrics.
    ///
    /// Percentiles come from the sorted response times; throughput is the
    /// sample count over the adjustment interval. An empty window yields
    /// zeros apart from the memory figure, which is always the caller's
    /// current reading.
    pub fn compute(&self, interval_secs: f64, memory_usage_mb: f64) -> PerformanceMetrics {
        let samples = self.samples.lock().unwrap();
        if samples.is_empty() {
            return PerformanceMetrics {
                memory_usage_mb,
                ..PerformanceMetrics::default()
            };
        }

        let count = samples.len();
        let mut times: Vec<f64> = samples.iter().map(|s| s.secs).collect();
        times.sort_by(|a, b| a.total_cmp(b));

        let errors = samples.iter().filter(|s| s.is_error).count();
        let timeouts = samples.iter().filter(|s| s.is_timeout).count();
        drop(samples);

        PerformanceMetrics {
            avg_response_time: times.iter().sum::<f64>() / count as f64,
            median_response_time: times[count / 2],
            p95_response_time: times[(count as f64 * 0.95) as usize],
            p99_response_time: times[(count as f64 * 0.99) as usize],
            requests_per_second: count as f64 / interval_secs,
            error_rate: errors as f64 / count as f64,
            timeout_rate: timeouts as f64 / count as f64,
            memory_usage_mb,
            sample_count: count,
        }
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Process memory tracking
///
/// Reads resident set size from `/proc/self/status` and reports zeros on
/// platforms without procfs. Memory figures feed the concurrency scoring
/// and the cleanup threshold that triggers cache purges under pressure.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Soft memory ceiling used for scoring and cleanup decisions
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 512;

/// Fraction of the limit at which cleanup kicks in
pub const CLEANUP_THRESHOLD: f64 = 0.8;

pub struct MemoryMonitor {
    limit_mb: u64,
    cleanup_threshold: f64,
    peak_kb: AtomicU64,
}

/// Point-in-time memory report
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub current_usage_mb: f64,
    pub peak_usage_mb: f64,
    pub limit_mb: u64,
    pub usage_percent: f64,
    pub cleanup_threshold: f64,
}

impl MemoryMonitor {
    pub fn new(limit_mb: u64) -> Self {
        Self {
            limit_mb,
            cleanup_threshold: CLEANUP_THRESHOLD,
            peak_kb: AtomicU64::new(0),
        }
    }

    /// Current resident set size in megabytes, tracking the peak as a side
    /// effect. Zero when the reading is unavailable.
    pub fn current_usage_mb(&self) -> f64 {
        let kb = resident_kb().unwrap_or(0);
        self.peak_kb.fetch_max(kb, Ordering::Relaxed);
        kb as f64 / 1024.0
    }

    pub fn peak_usage_mb(&self) -> f64 {
        self.peak_kb.load(Ordering::Relaxed) as f64 / 1024.0
    }

    pub fn limit_mb(&self) -> u64 {
        self.limit_mb
    }

    /// True once usage crosses the cleanup fraction of the limit
    pub fn should_cleanup(&self) -> bool {
        self.current_usage_mb() >= self.limit_mb as f64 * self.cleanup_threshold
    }

    pub fn stats(&self) -> MemoryStats {
        let current = self.current_usage_mb();
        MemoryStats {
            current_usage_mb: current,
            peak_usage_mb: self.peak_usage_mb(),
            limit_mb: self.limit_mb,
            usage_percent: if self.limit_mb > 0 {
                current / self.limit_mb as f64 * 100.0
            } else {
                0.0
            },
            cleanup_threshold: self.cleanup_threshold,
        }
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_LIMIT_MB)
    }
}

/// VmRSS from `/proc/self/status`, in kilobytes
fn resident_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest.split_whitespace().next()?.parse().ok();
        }
    }
    None
}

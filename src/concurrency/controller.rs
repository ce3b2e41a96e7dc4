/// Adaptive concurrency control
///
/// The controller owns the gate that bounds parallel requests and a
/// background timer that rescores the recent window every interval,
/// moving the gate's capacity between 1 and the configured maximum.
/// Four policies are available, from a fixed ceiling to aggressive
/// rescaling by the raw score.
use crate::concurrency::gate::AdaptiveGate;
use crate::concurrency::memory::{MemoryMonitor, MemoryStats};
use crate::concurrency::metrics::{PerformanceMetrics, SampleWindow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{watch, AcquireError, OwnedSemaphorePermit};
use tokio::task::JoinHandle;

/// Concurrency on startup under the adaptive policies
pub const INITIAL_CONCURRENCY: usize = 1;

/// Upper bound on concurrency unless configured otherwise
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// How often the controller rescores the window
pub const DEFAULT_ADJUSTMENT_INTERVAL: Duration = Duration::from_secs(10);

// ===== Optimization levels =====

/// How assertively concurrency follows the metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Fixed concurrency at the configured maximum
    None,

    /// Single steps on coarse error and latency signals
    Basic,

    /// Scored adjustment with damped steps
    #[default]
    Moderate,

    /// Scored adjustment applied at full strength
    Aggressive,
}

impl OptimizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }

    /// True for the policies that run the adjustment timer
    pub fn is_adaptive(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn all_levels() -> &'static [OptimizationLevel] {
        &[
            Self::None,
            Self::Basic,
            Self::Moderate,
            Self::Aggressive,
        ]
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ===== Controller =====

type CleanupFn = Box<dyn Fn() + Send + Sync>;

pub struct ConcurrencyController {
    level: OptimizationLevel,
    current: AtomicUsize,
    max: usize,
    interval: Duration,
    window: SampleWindow,
    memory: MemoryMonitor,
    gate: AdaptiveGate,
    last_adjustment: Mutex<Instant>,
    cleanup: Mutex<Option<CleanupFn>>,
    shutdown_tx: watch::Sender<bool>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Current concurrency position
#[derive(Debug, Clone, Serialize)]
pub struct ConcurrencySnapshot {
    pub current: usize,
    pub max: usize,
    pub level: OptimizationLevel,
}

/// Everything the controller knows, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct ControllerStats {
    pub concurrency: ConcurrencySnapshot,
    pub metrics: PerformanceMetrics,
    pub memory: MemoryStats,
}

impl ConcurrencyController {
    /// Builds a controller.
    ///
    /// Adaptive policies start at one slot and work upward; the fixed
    /// policy opens at the maximum and stays there.
    pub fn new(level: OptimizationLevel, max_concurrent: usize, memory_limit_mb: u64) -> Self {
        let initial = if level.is_adaptive() {
            INITIAL_CONCURRENCY.min(max_concurrent)
        } else {
            max_concurrent
        };
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            level,
            current: AtomicUsize::new(initial),
            max: max_concurrent,
            interval: DEFAULT_ADJUSTMENT_INTERVAL,
            window: SampleWindow::new(),
            memory: MemoryMonitor::new(memory_limit_mb),
            gate: AdaptiveGate::new(initial),
            last_adjustment: Mutex::new(Instant::now()),
            cleanup: Mutex::new(None),
            shutdown_tx,
            timer: Mutex::new(None),
        }
    }

    /// Overrides the adjustment interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Registers the action taken under memory pressure, typically a
    /// cache purge
    pub fn on_memory_pressure<F>(&self, action: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.cleanup.lock().unwrap() = Some(Box::new(action));
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn level(&self) -> OptimizationLevel {
        self.level
    }

    /// Waits for a request slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.gate.acquire().await
    }

    /// Feeds one finished request into the window
    pub fn record(&self, response_time: Duration, is_error: bool, is_timeout: bool) {
        self.window.record(response_time, is_error, is_timeout);
    }

    /// Starts the background adjustment timer. The fixed policy has
    /// nothing to adjust and starts nothing.
    pub fn start(self: &Arc<Self>) {
        if !self.level.is_adaptive() {
            return;
        }
        let mut timer = self.timer.lock().unwrap();
        if timer.is_some() {
            return;
        }

        let controller = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => controller.adjust(),
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::debug!("Concurrency adjustment timer stopped");
        });
        *timer = Some(handle);
        tracing::debug!(
            "Concurrency adjustment timer started ({}s interval, {} policy)",
            self.interval.as_secs_f64(),
            self.level
        );
    }

    /// Stops the timer. In-flight permits are unaffected.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// One adjustment cycle: sample memory, reduce the window, rescore,
    /// and move the gate when the target changes.
    ///
    /// Calls landing before a full interval has passed since the last
    /// adjustment are ignored, so overlapping triggers cannot thrash.
    pub fn adjust(&self) {
        {
            let mut last = self.last_adjustment.lock().unwrap();
            if last.elapsed() < self.interval {
                return;
            }
            *last = Instant::now();
        }

        if self.memory.should_cleanup() {
            tracing::warn!(
                "Memory pressure: {:.0} MB against a {} MB limit",
                self.memory.current_usage_mb(),
                self.memory.limit_mb()
            );
            if let Some(action) = &*self.cleanup.lock().unwrap() {
                action();
            }
        }

        let memory_mb = self.memory.current_usage_mb();
        let metrics = self.window.compute(self.interval.as_secs_f64(), memory_mb);
        if metrics.sample_count == 0 {
            return;
        }

        let current = self.current();
        let target = self.target_for(current, &metrics);
        if target != current {
            tracing::info!(
                "Concurrency {} -> {} (avg {:.2}s, errors {:.1}%, {:.0} MB)",
                current,
                target,
                metrics.avg_response_time,
                metrics.error_rate * 100.0,
                metrics.memory_usage_mb
            );
            self.current.store(target, Ordering::Relaxed);
            self.gate.resize(target);
        }
    }

    /// Policy dispatch, clamped to [1, max]
    fn target_for(&self, current: usize, metrics: &PerformanceMetrics) -> usize {
        let step = match self.level {
            OptimizationLevel::None => 0,
            OptimizationLevel::Basic => basic_step(metrics),
            OptimizationLevel::Moderate => damped_step(score(metrics)),
            OptimizationLevel::Aggressive => score(metrics),
        };
        (current as i64 + step as i64).clamp(1, self.max as i64) as usize
    }

    pub fn stats(&self) -> ControllerStats {
        let memory_mb = self.memory.current_usage_mb();
        ControllerStats {
            concurrency: ConcurrencySnapshot {
                current: self.current(),
                max: self.max,
                level: self.level,
            },
            metrics: self.window.compute(self.interval.as_secs_f64(), memory_mb),
            memory: self.memory.stats(),
        }
    }
}

// ===== Scoring =====

/// Scores the window: positive favors more concurrency, negative less.
///
/// Latency and error rate dominate; throughput and memory nudge.
fn score(metrics: &PerformanceMetrics) -> i32 {
    let mut score = 0;

    let avg = metrics.avg_response_time;
    if avg < 0.5 {
        score += 2;
    } else if avg < 1.0 {
        score += 1;
    } else if avg > 3.0 {
        score -= 2;
    } else if avg > 2.0 {
        score -= 1;
    }

    let errors = metrics.error_rate;
    if errors < 0.01 {
        score += 2;
    } else if errors < 0.05 {
        score += 1;
    } else if errors > 0.10 {
        score -= 3;
    } else if errors > 0.05 {
        score -= 1;
    }

    let rps = metrics.requests_per_second;
    if rps > 5.0 {
        score += 1;
    } else if rps < 1.0 {
        score -= 1;
    }

    let memory = metrics.memory_usage_mb;
    if memory > 500.0 {
        score -= 2;
    } else if memory > 300.0 {
        score -= 1;
    }

    score
}

/// Damps a score into a step of at most two slots either way
fn damped_step(score: i32) -> i32 {
    if score >= 2 {
        2
    } else if score == 1 {
        1
    } else if score == -1 {
        -1
    } else if score <= -2 {
        -2
    } else {
        0
    }
}

/// Coarse single-step policy: back off on heavy errors, inch up when
/// fast and clean
fn basic_step(metrics: &PerformanceMetrics) -> i32 {
    if metrics.error_rate > 0.10 {
        -1
    } else if metrics.avg_response_time < 1.0 && metrics.error_rate < 0.05 {
        1
    } else {
        0
    }
}

/// Adaptive concurrency subsystem
///
/// A resizable gate bounds parallel requests, a sliding window of samples
/// feeds the scoring, and the controller moves the gate between 1 and the
/// configured maximum on a background timer.
pub mod controller;
pub mod gate;
pub mod memory;
pub mod metrics;

pub use controller::{
    ConcurrencyController, ConcurrencySnapshot, ControllerStats, OptimizationLevel,
    DEFAULT_ADJUSTMENT_INTERVAL, DEFAULT_MAX_CONCURRENCY, INITIAL_CONCURRENCY,
};
pub use gate::AdaptiveGate;
pub use memory::{MemoryMonitor, MemoryStats, CLEANUP_THRESHOLD, DEFAULT_MEMORY_LIMIT_MB};
pub use metrics::{PerformanceMetrics, SampleWindow, WINDOW_CAPACITY};

//! Cumulative request counters and latency aggregation
//!
//! `StatsCollector` is owned by the orchestrator for its whole run and
//! mutated from concurrent request tasks; `CrawlerStats` is the immutable
//! snapshot handed out to callers and reports.

mod collector;

pub use collector::{CrawlerStats, StatsCollector};

//! Sumi-Tide: an adaptive web-crawling engine
//!
//! This crate fetches batches of pages under concurrency, rate, and memory
//! constraints, extracts structured data through pluggable site adapters,
//! caches results by request identity, and recovers from transient failures.
//! Parallelism is resized continuously from a rolling performance window.

pub mod adapters;
pub mod cache;
pub mod concurrency;
pub mod config;
pub mod crawler;
pub mod magnet;
pub mod model;
pub mod resilience;
pub mod stats;

use thiserror::Error;

/// Main error type for Sumi-Tide operations
#[derive(Debug, Error)]
pub enum TideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Task error: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Sumi-Tide operations
pub type Result<T> = std::result::Result<T, TideError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use concurrency::OptimizationLevel;
pub use config::{CrawlerConfig, SiteConfig};
pub use crawler::{CrawlEngine, EngineStats};
pub use model::{BatchResult, CrawlRequest, CrawlResult, CrawlStatus};

//! Crawl engine: fetcher, pre-fetch filter, and batch orchestration
//!
//! The engine composes every other subsystem into one pipeline. See
//! [`engine::CrawlEngine`] for the public API.

pub mod engine;
pub mod fetcher;
pub mod filter;

pub use engine::{CrawlEngine, EngineStats};
pub use fetcher::{FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use filter::{SkipReason, UrlFilter};

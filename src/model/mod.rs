//! Request/result model shared by every component
//!
//! This module defines the value types that flow through the engine:
//!
//! - `CrawlRequest`: immutable description of one fetch
//! - `CrawlResult`: terminal outcome with payload, timing, and parsed data
//! - `CrawlStatus`: the status state machine and its pure transition function
//! - `BatchResult`/`BatchSummary`: aggregate output of one batch

mod request;
mod result;
mod status;

// Re-export main types
pub use request::{CrawlRequest, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use result::{BatchResult, BatchSummary, ContentType, CrawlResult, FieldValue, ParsedData};
pub use status::{CrawlStatus, FetchOutcome};

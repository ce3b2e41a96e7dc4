/// Crawl result value types
///
/// `CrawlResult` is the per-request output of the orchestrator: terminal
/// status, payload, timing, and whatever the adapter subsystem extracted.
/// `BatchResult` wraps a whole batch with its summary and a stats snapshot.
use crate::model::status::CrawlStatus;
use crate::stats::CrawlerStats;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Coarse content classification derived from the response Content-Type header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Json,
    Xml,
    Text,
    Binary,
}

impl ContentType {
    /// Classifies a Content-Type header value.
    ///
    /// Pages without a recognizable header are treated as HTML, which is
    /// what the crawler is fetching in the common case.
    pub fn from_header(header: Option<&str>) -> Self {
        let Some(value) = header else {
            return Self::Html;
        };
        let value = value.to_ascii_lowercase();
        if value.contains("html") {
            Self::Html
        } else if value.contains("json") {
            Self::Json
        } else if value.contains("xml") {
            Self::Xml
        } else if value.starts_with("text/") {
            Self::Text
        } else {
            Self::Binary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

/// A single extracted field: one value or many
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single value; None when a selector matched nothing
    Text(Option<String>),

    /// All matches of a multi-valued selector
    List(Vec<String>),
}

impl FieldValue {
    /// Returns true if the field holds no usable value
    pub fn is_null(&self) -> bool {
        match self {
            Self::Text(value) => value.is_none(),
            Self::List(values) => values.is_empty(),
        }
    }

    /// Returns the single value, if this is a non-empty text field
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => value.as_deref(),
            Self::List(_) => None,
        }
    }

    /// Returns the list values, if this is a list field
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            Self::Text(_) => None,
        }
    }
}

/// Structured data extracted from a page by the adapter subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedData {
    /// Extracted fields keyed by selector name
    pub fields: BTreeMap<String, FieldValue>,

    /// Name of the adapter that produced the fields; None means the
    /// generic fallback path was used
    pub adapter_used: Option<String>,
}

impl ParsedData {
    /// Looks up one field by name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Result of one crawl request
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Requested URL
    pub url: String,

    /// Terminal status for this request
    pub status: CrawlStatus,

    /// HTTP status code when a response was received
    pub status_code: Option<u16>,

    /// Response body; always present for a non-cached success
    pub content: Option<String>,

    /// Content classification
    pub content_type: ContentType,

    /// Wall-clock time spent fetching; zero for cache hits and skips
    pub response_time: Duration,

    /// Error description for failed or skipped requests
    pub error: Option<String>,

    /// Retries consumed before reaching the terminal status
    pub retry_count: u32,

    /// True when the content was served from the cache
    pub cached: bool,

    /// Adapter extraction output, when content was parsed
    pub parsed: Option<ParsedData>,

    /// Caller metadata carried over from the request
    pub metadata: HashMap<String, String>,
}

impl CrawlResult {
    /// Creates a successful result
    pub fn success(url: impl Into<String>, content: String) -> Self {
        Self {
            url: url.into(),
            status: CrawlStatus::Success,
            status_code: Some(200),
            content: Some(content),
            content_type: ContentType::Html,
            response_time: Duration::ZERO,
            error: None,
            retry_count: 0,
            cached: false,
            parsed: None,
            metadata: HashMap::new(),
        }
    }

    /// Creates a failed result with an error description
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: CrawlStatus::Failed,
            status_code: None,
            content: None,
            content_type: ContentType::Html,
            response_time: Duration::ZERO,
            error: Some(error.into()),
            retry_count: 0,
            cached: false,
            parsed: None,
            metadata: HashMap::new(),
        }
    }

    /// Creates a skipped result for a filtered URL
    pub fn skipped(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: CrawlStatus::Skipped,
            status_code: None,
            content: None,
            content_type: ContentType::Html,
            response_time: Duration::ZERO,
            error: Some(reason.into()),
            retry_count: 0,
            cached: false,
            parsed: None,
            metadata: HashMap::new(),
        }
    }

    /// Length of the content payload in bytes, 0 when there is none
    pub fn content_length(&self) -> usize {
        self.content.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

/// Counts for one completed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cached: usize,
}

impl BatchSummary {
    /// Tallies a slice of results
    pub fn from_results(results: &[CrawlResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                CrawlStatus::Success => summary.successful += 1,
                CrawlStatus::Failed => summary.failed += 1,
                CrawlStatus::Skipped => summary.skipped += 1,
                _ => {}
            }
            if result.cached {
                summary.cached += 1;
            }
        }
        summary
    }
}

/// Output of one `crawl` call: results in completion order plus aggregates
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub summary: BatchSummary,
    pub results: Vec<CrawlResult>,
    pub stats: CrawlerStats,
}

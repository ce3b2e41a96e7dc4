/// Crawl request value type
///
/// A `CrawlRequest` is an immutable description of one fetch: URL, method,
/// optional headers and body, timeout, and retry bounds. Cache identity is
/// derived from (URL, method, body) - see the cache module.
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum retry attempts after the initial fetch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A single crawl request
///
/// The body is an ordered map so its serialized form is stable regardless of
/// how callers inserted the fields, which keeps cache keys deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Target URL
    pub url: String,

    /// HTTP method (defaults to GET)
    pub method: String,

    /// Optional extra request headers
    pub headers: Option<HashMap<String, String>>,

    /// Optional form body, ordered for stable serialization
    pub body: Option<BTreeMap<String, String>>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retries already consumed (starts at 0)
    pub retry_count: u32,

    /// Maximum retries allowed after the first attempt
    pub max_retries: u32,

    /// Opaque caller metadata, carried through to the result
    pub metadata: HashMap<String, String>,
}

impl CrawlRequest {
    /// Creates a GET request for `url` with default timeout and retry bounds
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            timeout: DEFAULT_TIMEOUT,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            metadata: HashMap::new(),
        }
    }

    /// Sets the HTTP method
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets extra request headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Sets the form body
    pub fn with_body(mut self, body: BTreeMap<String, String>) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attaches one metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Serializes the body in key order, empty string when there is none.
    ///
    /// Two requests whose bodies hold the same pairs produce the same string
    /// even if the pairs were inserted in different orders.
    pub fn body_repr(&self) -> String {
        match &self.body {
            None => String::new(),
            Some(body) => {
                let mut out = String::new();
                for (i, (k, v)) in body.iter().enumerate() {
                    if i > 0 {
                        out.push('&');
                    }
                    out.push_str(k);
                    out.push('=');
                    out.push_str(v);
                }
                out
            }
        }
    }
}

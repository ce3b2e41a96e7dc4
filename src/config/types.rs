use crate::concurrency::OptimizationLevel;
use serde::Deserialize;

/// Top-level crawler configuration
///
/// Every field has a default so that `CrawlerConfig::default()` yields a
/// working engine; a TOML file only needs the keys it wants to change.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Upper bound for adaptive concurrency
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Cache entry time-to-live in seconds
    #[serde(rename = "cache-ttl-secs", default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached responses
    #[serde(rename = "cache-max-entries", default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Global requests-per-second admission limit
    #[serde(rename = "rate-limit", default = "default_rate_limit")]
    pub rate_limit: f64,

    /// Concurrency adjustment strategy
    #[serde(default)]
    pub optimization: OptimizationLevel,

    /// Memory budget fed into the concurrency scoring
    #[serde(rename = "memory-limit-mb", default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    /// Hosts rejected by the pre-fetch filter
    #[serde(rename = "blocked-hosts", default)]
    pub blocked_hosts: Vec<String>,

    /// File extensions rejected by the pre-fetch filter
    #[serde(rename = "blocked-extensions", default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,

    /// Per-request timeout applied when a request does not carry its own
    #[serde(rename = "default-timeout-secs", default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Retry bound applied when a request does not carry its own
    #[serde(rename = "default-max-retries", default = "default_max_retries")]
    pub default_max_retries: u32,

    /// User-Agent header sent with every fetch
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Backoff policy between retry attempts
    #[serde(default)]
    pub retry: RetryConfig,

    /// Site-specific adapter configurations
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
            rate_limit: default_rate_limit(),
            optimization: OptimizationLevel::default(),
            memory_limit_mb: default_memory_limit_mb(),
            blocked_hosts: Vec::new(),
            blocked_extensions: default_blocked_extensions(),
            default_timeout_secs: default_timeout_secs(),
            default_max_retries: default_max_retries(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
            sites: Vec::new(),
        }
    }
}

/// Backoff configuration for the retry policy
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, counting the initial fetch
    #[serde(rename = "max-attempts", default = "default_retry_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in seconds
    #[serde(rename = "base-delay-secs", default = "default_retry_base_delay")]
    pub base_delay_secs: f64,

    /// Ceiling on any single delay, in seconds
    #[serde(rename = "max-delay-secs", default = "default_retry_max_delay")]
    pub max_delay_secs: f64,

    /// Exponential growth factor per attempt
    #[serde(rename = "exponential-base", default = "default_retry_exponential_base")]
    pub exponential_base: f64,

    /// Random spread applied to each delay (fraction of the delay)
    #[serde(default = "default_retry_jitter")]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            base_delay_secs: default_retry_base_delay(),
            max_delay_secs: default_retry_max_delay(),
            exponential_base: default_retry_exponential_base(),
            jitter: default_retry_jitter(),
        }
    }
}

/// Adapter-selection configuration for one site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Display name, also used as the adapter tag in parsed results
    pub name: String,

    /// URL pattern: exact string, glob (`*`), or `regex:`-prefixed
    #[serde(rename = "url-pattern")]
    pub url_pattern: String,

    /// Explicit adapter kind, overriding keyword detection
    #[serde(default)]
    pub adapter: Option<String>,

    /// Field selectors; empty means the adapter kind's default set
    #[serde(default)]
    pub selectors: Vec<SelectorConfig>,

    /// Requests per second this site tolerates
    #[serde(rename = "rate-limit", default = "default_site_rate_limit")]
    pub rate_limit: f64,

    /// Concurrent request bound for this site
    #[serde(rename = "max-concurrent", default = "default_site_max_concurrent")]
    pub max_concurrent: usize,

    /// Whether listing pages paginate
    #[serde(default = "default_true")]
    pub pagination: bool,

    /// Per-site timeout override, in seconds
    #[serde(rename = "timeout-secs", default)]
    pub timeout_secs: Option<u64>,

    /// Per-site retry bound override
    #[serde(rename = "max-retries", default)]
    pub max_retries: Option<u32>,
}

impl SiteConfig {
    /// Creates a site entry with defaults for everything but name and pattern
    pub fn new(name: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_pattern: url_pattern.into(),
            adapter: None,
            selectors: Vec::new(),
            rate_limit: default_site_rate_limit(),
            max_concurrent: default_site_max_concurrent(),
            pagination: true,
            timeout_secs: None,
            max_retries: None,
        }
    }
}

/// One declared field selector
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Field name in the extraction result
    pub name: String,

    /// `regex:`-prefixed pattern, or a CSS selector
    pub selector: String,

    /// Attribute to read from matched elements; element text when absent
    #[serde(default)]
    pub attribute: Option<String>,

    /// Collect every match instead of the first
    #[serde(default)]
    pub multiple: bool,

    /// Whether a null value fails whole-result validation
    #[serde(default = "default_true")]
    pub required: bool,

    /// Named transform applied to extracted values (e.g. "trim")
    #[serde(rename = "post-process", default)]
    pub post_process: Option<String>,
}

impl SelectorConfig {
    /// Creates a required single-valued selector
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            attribute: None,
            multiple: false,
            required: true,
            post_process: None,
        }
    }

    /// Marks the selector optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Collects every match
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Reads an attribute instead of element text
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Applies a named transform to extracted values
    pub fn post_process(mut self, name: impl Into<String>) -> Self {
        self.post_process = Some(name.into());
        self
    }
}

fn default_max_concurrent() -> usize {
    10
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_max_entries() -> usize {
    1000
}

fn default_rate_limit() -> f64 {
    5.0
}

fn default_memory_limit_mb() -> u64 {
    512
}

fn default_blocked_extensions() -> Vec<String> {
    [".jpg", ".png", ".gif", ".css", ".js"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("sumi-tide/{}", env!("CARGO_PKG_VERSION"))
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> f64 {
    1.0
}

fn default_retry_max_delay() -> f64 {
    60.0
}

fn default_retry_exponential_base() -> f64 {
    2.0
}

fn default_retry_jitter() -> f64 {
    0.2
}

fn default_site_rate_limit() -> f64 {
    2.0
}

fn default_site_max_concurrent() -> usize {
    5
}

fn default_true() -> bool {
    true
}

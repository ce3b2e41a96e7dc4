//! HTTP fetching for the crawl engine
//!
//! The engine talks to the network through the `Fetcher` trait so tests can
//! substitute scripted collaborators. The production implementation wraps
//! `reqwest` with the client settings the engine needs:
//! - Shared client with gzip/brotli decompression
//! - Redirects followed up to 10 hops
//! - Per-request timeout taken from the `CrawlRequest`
//! - Error classification into transient vs. permanent

use crate::model::{ContentType, CrawlRequest};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Method};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Connect-phase timeout, independent of the per-request total
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirect hop limit
const MAX_REDIRECTS: usize = 10;

/// A fetched page, before extraction
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code of the final response
    pub status_code: u16,

    /// Response body as text
    pub body: String,

    /// Classification of the Content-Type header
    pub content_type: ContentType,
}

/// Classified fetch failure.
///
/// `Timeout` and `Connection` are transient and retry-eligible; `Http` and
/// `Invalid` are structural and never retried.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP error {0}")]
    Http(u16),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl FetchError {
    /// True for failures expected to resolve themselves on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_))
    }

    /// True specifically for timeouts, tracked separately in the
    /// controller's window
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// The engine's network collaborator
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one request, without retries. Retrying is the engine's job.
    async fn fetch(&self, request: &CrawlRequest) -> Result<FetchedPage, FetchError>;
}

/// Production fetcher backed by a shared `reqwest` client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the fetcher and its HTTP client.
    ///
    /// The client carries no global timeout; each fetch applies the
    /// request's own.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(CONNECT_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Invalid(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &CrawlRequest) -> Result<FetchedPage, FetchError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| FetchError::Invalid(format!("Bad HTTP method: {}", request.method)))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);

        if let Some(headers) = &request.headers {
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
        }
        if let Some(body) = &request.body {
            let form: HashMap<&str, &str> = body
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            builder = builder.form(&form);
        }

        let response = builder.send().await.map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %request.url, status = status.as_u16(), "HTTP error response");
            return Err(FetchError::Http(status.as_u16()));
        }

        let content_type = ContentType::from_header(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
        );

        let body = response.text().await.map_err(classify_send_error)?;

        Ok(FetchedPage {
            status_code: status.as_u16(),
            body,
            content_type,
        })
    }
}

/// Maps a reqwest error onto the engine's taxonomy
fn classify_send_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connection(error.to_string())
    } else if error.is_builder() || error.is_request() {
        FetchError::Invalid(error.to_string())
    } else {
        // Body/decode failures mid-transfer behave like connection drops
        FetchError::Connection(error.to_string())
    }
}

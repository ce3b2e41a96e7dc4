/// Content-addressed cache key derivation
///
/// Identity is (URL, method, body): two requests that differ only in header
/// order or body insertion order hash to the same key.
use crate::model::CrawlRequest;
use sha2::{Digest, Sha256};

/// Computes the cache key for a request.
///
/// The key is the hex SHA-256 digest of `url|method|body`, where the body is
/// serialized in key order (see `CrawlRequest::body_repr`).
pub fn cache_key(request: &CrawlRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.url.as_bytes());
    hasher.update(b"|");
    hasher.update(request.method.as_bytes());
    hasher.update(b"|");
    hasher.update(request.body_repr().as_bytes());
    hex::encode(hasher.finalize())
}

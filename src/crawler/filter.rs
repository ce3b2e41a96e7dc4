//! Pre-fetch URL filter
//!
//! Rejections happen before the request consumes a concurrency slot or a
//! rate-limit token: blocked hosts and non-content file extensions become
//! `Skipped` results without touching the network.

use url::Url;

/// Why a URL was rejected before fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The URL's host matches a blocked host or one of its subdomains
    BlockedHost(String),

    /// The URL's path ends in a blocked extension
    BlockedExtension(String),
}

impl SkipReason {
    /// Human-readable description for the result's error field
    pub fn describe(&self) -> String {
        match self {
            Self::BlockedHost(host) => format!("Blocked host: {}", host),
            Self::BlockedExtension(ext) => format!("Blocked extension: {}", ext),
        }
    }
}

/// Matches URLs against blocked hosts and extensions
pub struct UrlFilter {
    blocked_hosts: Vec<String>,
    blocked_extensions: Vec<String>,
}

impl UrlFilter {
    /// Builds a filter. Hosts and extensions are compared case-insensitively;
    /// extensions are normalized to a leading dot.
    pub fn new(blocked_hosts: &[String], blocked_extensions: &[String]) -> Self {
        Self {
            blocked_hosts: blocked_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            blocked_extensions: blocked_extensions
                .iter()
                .map(|e| {
                    let e = e.to_ascii_lowercase();
                    if e.starts_with('.') {
                        e
                    } else {
                        format!(".{}", e)
                    }
                })
                .collect(),
        }
    }

    /// Checks one URL, returning the reason it should be skipped, if any.
    ///
    /// Unparsable URLs pass the filter; they fail later in the fetch step
    /// as permanent errors, which keeps "filtered" and "malformed" distinct.
    pub fn check(&self, url: &str) -> Option<SkipReason> {
        let Ok(parsed) = Url::parse(url) else {
            return None;
        };

        if let Some(host) = parsed.host_str() {
            let host = host.to_ascii_lowercase();
            for blocked in &self.blocked_hosts {
                if host == *blocked || host.ends_with(&format!(".{}", blocked)) {
                    return Some(SkipReason::BlockedHost(blocked.clone()));
                }
            }
        }

        let path = parsed.path().to_ascii_lowercase();
        for extension in &self.blocked_extensions {
            if path.ends_with(extension.as_str()) {
                return Some(SkipReason::BlockedExtension(extension.clone()));
            }
        }

        None
    }
}

/// In-memory TTL cache for crawl results
///
/// Bounded by entry count and by per-entry TTL. The cache is an optimization
/// only: a poisoned lock degrades to miss/no-op instead of failing the crawl.
use crate::cache::key::cache_key;
use crate::model::{ContentType, CrawlRequest};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default maximum number of entries
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default time-to-live for stored content
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// One cached payload
#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    content_type: ContentType,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    /// Live (unexpired) entries at snapshot time
    pub entry_count: usize,

    /// Sum of stored content lengths in bytes
    pub approx_size: usize,

    /// hits / (hits + misses), 0 when no lookups have occurred
    pub hit_rate: f64,
}

/// Content-addressed response cache
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Creates a cache bounded to `max_entries` with the given default TTL
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a request, returning the stored content and its type.
    ///
    /// Expired entries are removed on access and count as misses.
    pub fn get(&self, request: &CrawlRequest) -> Option<(String, ContentType)> {
        let key = cache_key(request);
        let Ok(mut entries) = self.entries.lock() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match entries.get(&key) {
            Some(entry) if !entry.is_expired() => {
                let hit = (entry.content.clone(), entry.content_type);
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %request.url, "Cache hit");
                Some(hit)
            }
            Some(_) => {
                entries.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores content for a request with the default TTL
    pub fn set(&self, request: &CrawlRequest, content: &str, content_type: ContentType) {
        self.set_with_ttl(request, content, content_type, self.default_ttl);
    }

    /// Stores content with an explicit TTL, overwriting any existing entry.
    ///
    /// Empty content is never stored: a cached success must carry a payload.
    pub fn set_with_ttl(
        &self,
        request: &CrawlRequest,
        content: &str,
        content_type: ContentType,
        ttl: Duration,
    ) {
        if content.is_empty() {
            return;
        }

        let key = cache_key(request);
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            Self::evict_oldest(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                content: content.to_string(),
                content_type,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drops every expired entry, returning how many were removed.
    ///
    /// This is the best-effort cleanup pass run under memory pressure.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Removes all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Returns a snapshot of entry counts, size, and hit rate
    pub fn stats(&self) -> CacheStats {
        let (entry_count, approx_size) = match self.entries.lock() {
            Ok(entries) => {
                let live = entries.values().filter(|e| !e.is_expired());
                live.fold((0, 0), |(count, size), entry| {
                    (count + 1, size + entry.content.len())
                })
            }
            Err(_) => (0, 0),
        };

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };

        CacheStats {
            entry_count,
            approx_size,
            hit_rate,
        }
    }

    fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            entries.remove(&key);
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_request() -> CrawlRequest {
        CrawlRequest::new("https://example.com/page")
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ResponseCache::default();
        let request = get_request();

        assert!(cache.get(&request).is_none());

        cache.set(&request, "<html>body</html>", ContentType::Html);
        let (content, content_type) = cache.get(&request).unwrap();
        assert_eq!(content, "<html>body</html>");
        assert_eq!(content_type, ContentType::Html);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = ResponseCache::default();
        let request = get_request();

        cache.set(&request, "first", ContentType::Html);
        cache.set(&request, "second", ContentType::Html);

        let (content, _) = cache.get(&request).unwrap();
        assert_eq!(content, "second");
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn test_empty_content_never_stored() {
        let cache = ResponseCache::default();
        let request = get_request();

        cache.set(&request, "", ContentType::Html);
        assert!(cache.get(&request).is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResponseCache::default();
        let request = get_request();

        cache.set_with_ttl(&request, "body", ContentType::Html, Duration::ZERO);
        assert!(cache.get(&request).is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResponseCache::new(2, DEFAULT_TTL);
        let first = CrawlRequest::new("https://example.com/1");
        let second = CrawlRequest::new("https://example.com/2");
        let third = CrawlRequest::new("https://example.com/3");

        cache.set(&first, "one", ContentType::Html);
        std::thread::sleep(Duration::from_millis(5));
        cache.set(&second, "two", ContentType::Html);
        std::thread::sleep(Duration::from_millis(5));
        cache.set(&third, "three", ContentType::Html);

        assert!(cache.get(&first).is_none(), "oldest entry should be evicted");
        assert!(cache.get(&second).is_some());
        assert!(cache.get(&third).is_some());
        assert_eq!(cache.stats().entry_count, 2);
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResponseCache::default();
        let live = CrawlRequest::new("https://example.com/live");
        let dead = CrawlRequest::new("https://example.com/dead");

        cache.set(&live, "live", ContentType::Html);
        cache.set_with_ttl(&dead, "dead", ContentType::Html, Duration::ZERO);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().entry_count, 1);
        assert!(cache.get(&live).is_some());
    }

    #[test]
    fn test_hit_rate() {
        let cache = ResponseCache::default();
        let request = get_request();

        assert_eq!(cache.stats().hit_rate, 0.0);

        cache.get(&request);
        cache.set(&request, "body", ContentType::Html);
        cache.get(&request);

        // One miss, one hit
        let stats = cache.stats();
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_approx_size_tracks_content_length() {
        let cache = ResponseCache::default();
        cache.set(
            &CrawlRequest::new("https://example.com/a"),
            "12345",
            ContentType::Html,
        );
        cache.set(
            &CrawlRequest::new("https://example.com/b"),
            "1234567890",
            ContentType::Html,
        );
        assert_eq!(cache.stats().approx_size, 15);
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::default();
        let request = get_request();
        cache.set(&request, "body", ContentType::Html);
        cache.clear();
        assert!(cache.get(&request).is_none());
    }
}

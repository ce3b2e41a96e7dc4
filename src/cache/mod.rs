//! Content-addressed response cache
//!
//! Caching is keyed by request identity (URL, method, body) so that
//! semantically identical requests collide regardless of field ordering.
//! Entries expire by TTL and the store is bounded by entry count.

mod key;
mod store;

pub use key::cache_key;
pub use store::{CacheStats, ResponseCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};

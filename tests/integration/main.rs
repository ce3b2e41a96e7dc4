//! Integration test binary
//!
//! One binary for the whole directory so helper code can be shared.

mod crawl_tests;

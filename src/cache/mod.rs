//! Cache module for storing API responses to disk
//!
//! This module provides a cache manager that persists raw API responses to the
//! results directory. An existing file short-circuits its fetch; there is no
//! expiry, so only a forced run refreshes a file that is already on disk.

mod manager;

pub use manager::{to_pretty_json, CacheError, CacheKey, CacheManager, CacheOutcome, CacheStatus};

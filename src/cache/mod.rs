//! Cache Module
//!
//! Provides a bounded in-memory cache with LRU eviction.

mod bounded;
mod lru;
mod stats;


// Re-export public types
pub use bounded::BoundedCache;
pub(crate) use lru::{LruList, Slot};
pub use stats::CacheStats;

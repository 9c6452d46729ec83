//! ITAM Cache - client-side caching primitives for asset and ticket data
//!
//! Provides a bounded LRU cache and an asynchronous namespaced record store
//! backed by redb. The two compose into a read-through cache at the call site.

pub mod cache;
pub mod config;
pub mod error;
pub mod store;

pub use cache::{BoundedCache, CacheStats};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{KeyedStore, NamespaceInfo, Record, StorePhase};

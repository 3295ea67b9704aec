//! Versioned response cache.
//!
//! This module provides the persistent side of request interception:
//! - Buckets of request → response snapshots, addressed by name
//! - The generation pair naming the live static and dynamic buckets
//! - A SQLite store with atomic per-key operations and transactional batches

mod generation;
mod key;
mod storage;
mod traits;

pub use generation::Generation;
pub use key::RequestKey;
pub use storage::SqliteStore;
pub use traits::{CacheStore, CachedEntry, Served, Source};

#[cfg(test)]
pub mod testing;

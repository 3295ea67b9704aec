//! Core traits and types for the cache store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;

use super::generation::Generation;
use super::key::RequestKey;
use crate::net::Response;

/// A stored response and when it was written.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub response: Response,
  pub stored_at: DateTime<Utc>,
}

/// Persistent key → response table, partitioned into named buckets.
///
/// Every method is atomic on its own; `put_all` is atomic as a whole.
#[async_trait]
pub trait CacheStore: Send + Sync {
  /// Names of every bucket currently present.
  async fn bucket_names(&self) -> Result<Vec<String>>;

  async fn has_bucket(&self, bucket: &str) -> Result<bool>;

  /// Look up one entry. `None` is a cache miss.
  async fn get(&self, bucket: &str, key: &RequestKey) -> Result<Option<CachedEntry>>;

  /// Insert or overwrite one entry, creating the bucket if needed.
  async fn put(&self, bucket: &str, key: &RequestKey, response: &Response) -> Result<()>;

  /// Replace the bucket's contents with `entries`, creating it if needed.
  /// Either every entry is written or the bucket is left untouched.
  async fn put_all(&self, bucket: &str, entries: &[(RequestKey, Response)]) -> Result<()>;

  /// Remove one entry. Returns whether it existed.
  async fn delete(&self, bucket: &str, key: &RequestKey) -> Result<bool>;

  /// Remove a bucket and all its entries. Returns whether it existed.
  async fn delete_bucket(&self, bucket: &str) -> Result<bool>;

  /// The generation that last completed activation.
  async fn active_generation(&self) -> Result<Option<Generation>>;

  async fn set_active_generation(&self, generation: &Generation) -> Result<()>;
}

/// A response handed back to the caller, with where it came from.
#[derive(Debug, Clone)]
pub struct Served {
  pub response: Response,
  pub source: Source,
}

impl Served {
  pub fn from_network(response: Response) -> Self {
    Self {
      response,
      source: Source::Network,
    }
  }

  pub fn from_cache(entry: CachedEntry) -> Self {
    Self {
      response: entry.response,
      source: Source::Cache {
        stored_at: entry.stored_at,
      },
    }
  }

  /// The cached root document served in place of a page.
  pub fn shell(entry: CachedEntry) -> Self {
    Self {
      response: entry.response,
      source: Source::Shell,
    }
  }

  pub fn offline() -> Self {
    Self {
      response: Response::offline(),
      source: Source::Offline,
    }
  }
}

/// Indicates where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  /// Fresh response from the network
  Network,
  /// Stored entry for this exact request
  Cache { stored_at: DateTime<Utc> },
  /// Cached root document used as offline navigation fallback
  Shell,
  /// Synthetic 503, neither network nor cache could answer
  Offline,
}

impl Source {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Network => "network",
      Self::Cache { .. } => "cache",
      Self::Shell => "shell",
      Self::Offline => "offline",
    }
  }
}

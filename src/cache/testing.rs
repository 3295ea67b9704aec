//! Store double that fails chosen operations, for lifecycle and worker tests.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};

use super::{CacheStore, CachedEntry, Generation, RequestKey, SqliteStore};
use crate::net::Response;

/// In-memory SQLite store with two injectable faults.
pub struct FaultyStore {
  inner: SqliteStore,
  sticky_bucket: Option<&'static str>,
  refuse_claim: bool,
}

impl FaultyStore {
  pub fn new() -> Self {
    Self {
      inner: SqliteStore::open_in_memory().unwrap(),
      sticky_bucket: None,
      refuse_claim: false,
    }
  }

  /// `delete_bucket` fails for this bucket.
  pub fn sticky_bucket(mut self, bucket: &'static str) -> Self {
    self.sticky_bucket = Some(bucket);
    self
  }

  /// `set_active_generation` always fails.
  pub fn refuse_claim(mut self) -> Self {
    self.refuse_claim = true;
    self
  }
}

#[async_trait]
impl CacheStore for FaultyStore {
  async fn bucket_names(&self) -> Result<Vec<String>> {
    self.inner.bucket_names().await
  }

  async fn has_bucket(&self, bucket: &str) -> Result<bool> {
    self.inner.has_bucket(bucket).await
  }

  async fn get(&self, bucket: &str, key: &RequestKey) -> Result<Option<CachedEntry>> {
    self.inner.get(bucket, key).await
  }

  async fn put(&self, bucket: &str, key: &RequestKey, response: &Response) -> Result<()> {
    self.inner.put(bucket, key, response).await
  }

  async fn put_all(&self, bucket: &str, entries: &[(RequestKey, Response)]) -> Result<()> {
    self.inner.put_all(bucket, entries).await
  }

  async fn delete(&self, bucket: &str, key: &RequestKey) -> Result<bool> {
    self.inner.delete(bucket, key).await
  }

  async fn delete_bucket(&self, bucket: &str) -> Result<bool> {
    if self.sticky_bucket == Some(bucket) {
      return Err(eyre!("bucket {} is locked", bucket));
    }
    self.inner.delete_bucket(bucket).await
  }

  async fn active_generation(&self) -> Result<Option<Generation>> {
    self.inner.active_generation().await
  }

  async fn set_active_generation(&self, generation: &Generation) -> Result<()> {
    if self.refuse_claim {
      return Err(eyre!("lifecycle state is read-only"));
    }
    self.inner.set_active_generation(generation).await
  }
}

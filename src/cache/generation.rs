/// Names of the two live buckets for one deployment.
///
/// Current vs stale is decided purely by name equality; a generation never
/// looks inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
  static_bucket: String,
  dynamic_bucket: String,
}

impl Generation {
  /// Derive bucket names as `{prefix}-static-{version}` and `{prefix}-dynamic-{version}`.
  pub fn new(prefix: &str, version: &str) -> Self {
    Self {
      static_bucket: format!("{}-static-{}", prefix, version),
      dynamic_bucket: format!("{}-dynamic-{}", prefix, version),
    }
  }

  /// Rebuild a generation from persisted bucket names.
  pub fn from_names(static_bucket: String, dynamic_bucket: String) -> Self {
    Self {
      static_bucket,
      dynamic_bucket,
    }
  }

  /// Bucket holding immutable build assets.
  pub fn static_bucket(&self) -> &str {
    &self.static_bucket
  }

  /// Bucket holding runtime-fetched responses.
  pub fn dynamic_bucket(&self) -> &str {
    &self.dynamic_bucket
  }

  /// Whether `bucket` holds one of this generation's roles.
  pub fn owns(&self, bucket: &str) -> bool {
    bucket == self.static_bucket || bucket == self.dynamic_bucket
  }
}

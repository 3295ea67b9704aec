use sha2::{Digest, Sha256};

/// Identity of a cached request: method plus full URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
  method: String,
  url: String,
}

impl RequestKey {
  pub fn new(method: &str, url: &str) -> Self {
    Self {
      method: method.to_ascii_uppercase(),
      url: url.to_string(),
    }
  }

  /// Human readable form, e.g. `GET http://localhost:8080/`.
  pub fn description(&self) -> String {
    format!("{} {}", self.method, self.url)
  }

  /// SHA256 of the description, used as the stable storage key.
  pub fn hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.description().as_bytes());
    hex::encode(hasher.finalize())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_method_is_normalized() {
    let a = RequestKey::new("get", "http://localhost/a.css");
    let b = RequestKey::new("GET", "http://localhost/a.css");
    assert_eq!(a, b);
    assert_eq!(a.hash(), b.hash());
  }

  #[test]
  fn test_query_string_is_part_of_identity() {
    let a = RequestKey::new("GET", "http://localhost/api/data?page=1");
    let b = RequestKey::new("GET", "http://localhost/api/data?page=2");
    assert_ne!(a.hash(), b.hash());
  }

  #[test]
  fn test_hash_is_hex_sha256() {
    let hash = RequestKey::new("GET", "http://localhost/").hash();
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
  }
}

use reqwest::Method;
use url::Url;

use crate::cache::RequestKey;

/// An outgoing request as seen by the interceptor.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  /// Raw Accept header, if the caller sent one
  pub accept: Option<String>,
}

impl Request {
  /// A plain GET for the given URL with no Accept header.
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      accept: None,
    }
  }

  /// A GET that accepts HTML, as a page navigation would send it.
  pub fn navigate(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      accept: Some("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8".to_string()),
    }
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }

  /// Whether the caller asked for an HTML document.
  pub fn accepts_html(&self) -> bool {
    self
      .accept
      .as_deref()
      .is_some_and(|accept| accept.contains("text/html"))
  }

  /// Whether this request targets the same origin as `origin`.
  pub fn is_same_origin(&self, origin: &Url) -> bool {
    self.url.origin() == origin.origin()
  }

  /// Identity used to key cache entries.
  pub fn cache_key(&self) -> RequestKey {
    RequestKey::new(self.method.as_str(), self.url.as_str())
  }
}

/// Snapshot of an HTTP response.
///
/// Cloning is the equivalent of `Response.clone()` in a browser: the copy
/// written to the cache and the one handed back to the caller are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub status_text: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    let status_text = reqwest::StatusCode::from_u16(status)
      .ok()
      .and_then(|s| s.canonical_reason())
      .unwrap_or_default()
      .to_string();

    Self {
      status,
      status_text,
      headers: Vec::new(),
      body: body.into(),
    }
  }

  pub fn with_header(mut self, name: &str, value: &str) -> Self {
    self.headers.push((name.to_string(), value.to_string()));
    self
  }

  /// Synthetic response used whenever neither network nor cache can answer.
  pub fn offline() -> Self {
    Self {
      status: 503,
      status_text: "Service Unavailable".to_string(),
      headers: vec![("content-type".to_string(), "text/plain".to_string())],
      body: b"Offline".to_vec(),
    }
  }

  /// 2xx status.
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

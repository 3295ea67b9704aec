use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::time::Duration;

use super::types::{Request, Response};

/// Failure to obtain a usable response from the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
  /// Connection refused, DNS failure, reset, ...
  #[error("network unreachable: {message}")]
  Unreachable { message: String },

  #[error("request timed out")]
  Timeout,

  /// The server answered, but not with a success status.
  #[error("unsuccessful status {status}")]
  Status { status: u16 },
}

/// The network capability the executors fetch through.
#[async_trait]
pub trait Network: Send + Sync {
  /// Perform the request. Any HTTP status is returned as `Ok`; only transport
  /// failures are errors.
  async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;

  /// Like `fetch`, but a non-2xx answer counts as a failure.
  async fn fetch_ok(&self, request: &Request) -> Result<Response, NetworkError> {
    let response = self.fetch(request).await?;
    if response.is_success() {
      Ok(response)
    } else {
      Err(NetworkError::Status {
        status: response.status,
      })
    }
  }
}

/// Network implementation backed by reqwest.
#[derive(Clone)]
pub struct HttpNetwork {
  client: reqwest::Client,
}

impl HttpNetwork {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("swcache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Network for HttpNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
    let mut builder = self
      .client
      .request(request.method.clone(), request.url.clone());
    if let Some(accept) = &request.accept {
      builder = builder.header(reqwest::header::ACCEPT, accept);
    }

    let response = builder.send().await.map_err(map_reqwest_error)?;

    let status = response.status();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect();
    let body = response.bytes().await.map_err(map_reqwest_error)?;

    Ok(Response {
      status: status.as_u16(),
      status_text: status.canonical_reason().unwrap_or_default().to_string(),
      headers,
      body: body.to_vec(),
    })
  }
}

fn map_reqwest_error(e: reqwest::Error) -> NetworkError {
  if e.is_timeout() {
    NetworkError::Timeout
  } else {
    NetworkError::Unreachable {
      message: e.to_string(),
    }
  }
}

//! In-process network double for executor and lifecycle tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Network, NetworkError, Request, Response};

/// Serves canned responses by URL path and counts every call.
pub struct ScriptedNetwork {
  routes: Mutex<HashMap<String, Response>>,
  online: AtomicBool,
  calls: AtomicUsize,
}

impl ScriptedNetwork {
  pub fn new() -> Self {
    Self {
      routes: Mutex::new(HashMap::new()),
      online: AtomicBool::new(true),
      calls: AtomicUsize::new(0),
    }
  }

  pub fn route(self, path: &str, response: Response) -> Self {
    self.set_route(path, response);
    self
  }

  pub fn set_route(&self, path: &str, response: Response) {
    self
      .routes
      .lock()
      .unwrap()
      .insert(path.to_string(), response);
  }

  pub fn set_online(&self, online: bool) {
    self.online.store(online, Ordering::SeqCst);
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Network for ScriptedNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    if !self.online.load(Ordering::SeqCst) {
      return Err(NetworkError::Unreachable {
        message: "offline".to_string(),
      });
    }

    let routes = self.routes.lock().unwrap();
    Ok(
      routes
        .get(request.url.path())
        .cloned()
        .unwrap_or_else(|| Response::new(404, "not found")),
    )
  }
}

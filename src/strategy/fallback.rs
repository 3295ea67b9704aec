use tracing::{debug, warn};

use crate::cache::{CacheStore, Generation, RequestKey, Served};
use crate::net::Request;

/// What the user sees once network and cache have both failed.
///
/// Page navigations get the cached root document (the application shell)
/// from the static bucket; everything else gets the synthetic 503.
pub async fn offline_fallback<S>(store: &S, generation: &Generation, request: &Request) -> Served
where
  S: CacheStore + ?Sized,
{
  if !request.accepts_html() {
    return Served::offline();
  }

  let root = match request.url.join("/") {
    Ok(root) => root,
    Err(_) => return Served::offline(),
  };
  let key = RequestKey::new("GET", root.as_str());

  match store.get(generation.static_bucket(), &key).await {
    Ok(Some(entry)) => {
      debug!(url = %request.url, "serving cached shell");
      Served::shell(entry)
    }
    Ok(None) => Served::offline(),
    Err(e) => {
      warn!(url = %request.url, error = %e, "failed to read cached shell");
      Served::offline()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{Source, SqliteStore};
  use crate::net::Response;
  use url::Url;

  fn url(path: &str) -> Url {
    Url::parse("http://localhost:8080").unwrap().join(path).unwrap()
  }

  async fn store_with_shell(generation: &Generation) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .put(
        generation.static_bucket(),
        &Request::get(url("/")).cache_key(),
        &Response::new(200, "<html>shell</html>"),
      )
      .await
      .unwrap();
    store
  }

  #[tokio::test]
  async fn test_html_request_gets_shell() {
    let generation = Generation::new("playground", "v1");
    let store = store_with_shell(&generation).await;

    let served = offline_fallback(&store, &generation, &Request::navigate(url("/tools/uuid?x=1"))).await;
    assert_eq!(served.source, Source::Shell);
    assert_eq!(served.response.body_text(), "<html>shell</html>");
  }

  #[tokio::test]
  async fn test_non_html_request_gets_503() {
    let generation = Generation::new("playground", "v1");
    let store = store_with_shell(&generation).await;

    let served = offline_fallback(&store, &generation, &Request::get(url("/api/data"))).await;
    assert_eq!(served.source, Source::Offline);
    assert_eq!(served.response.status, 503);
  }

  #[tokio::test]
  async fn test_missing_shell_gets_503() {
    let generation = Generation::new("playground", "v1");
    let store = SqliteStore::open_in_memory().unwrap();

    let served = offline_fallback(&store, &generation, &Request::navigate(url("/"))).await;
    assert_eq!(served.source, Source::Offline);
  }

  #[tokio::test]
  async fn test_shell_from_other_generation_is_ignored() {
    let old = Generation::new("playground", "v0");
    let store = store_with_shell(&old).await;

    let current = Generation::new("playground", "v1");
    let served = offline_fallback(&store, &current, &Request::navigate(url("/"))).await;
    assert_eq!(served.source, Source::Offline);
  }
}

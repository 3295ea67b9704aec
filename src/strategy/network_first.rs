use tracing::{debug, warn};

use super::fallback::offline_fallback;
use crate::cache::{CacheStore, Generation, Served};
use crate::net::{Network, Request};

/// Try the network; fall back to the dynamic bucket, then to the offline
/// fallback.
///
/// Successful responses overwrite whatever the dynamic bucket held for the
/// same request.
pub async fn network_first<S>(
  store: &S,
  network: &dyn Network,
  generation: &Generation,
  request: &Request,
) -> Served
where
  S: CacheStore + ?Sized,
{
  let bucket = generation.dynamic_bucket();
  let key = request.cache_key();

  match network.fetch_ok(request).await {
    Ok(response) => {
      if let Err(e) = store.put(bucket, &key, &response).await {
        warn!(url = %request.url, error = %e, "failed to cache response");
      }
      return Served::from_network(response);
    }
    Err(e) => debug!(url = %request.url, error = %e, "network failed, trying cache"),
  }

  match store.get(bucket, &key).await {
    Ok(Some(entry)) => return Served::from_cache(entry),
    Ok(None) => {}
    Err(e) => warn!(url = %request.url, error = %e, "cache read failed"),
  }

  offline_fallback(store, generation, request).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{Source, SqliteStore};
  use crate::net::testing::ScriptedNetwork;
  use crate::net::Response;
  use url::Url;

  fn url(path: &str) -> Url {
    Url::parse("http://localhost:8080").unwrap().join(path).unwrap()
  }

  #[tokio::test]
  async fn test_network_preferred_over_cache() {
    let generation = Generation::new("playground", "v1");
    let store = SqliteStore::open_in_memory().unwrap();
    let request = Request::get(url("/api/data"));
    store
      .put(
        generation.dynamic_bucket(),
        &request.cache_key(),
        &Response::new(200, "old"),
      )
      .await
      .unwrap();
    let network = ScriptedNetwork::new().route("/api/data", Response::new(200, "new"));

    let served = network_first(&store, &network, &generation, &request).await;
    assert_eq!(served.source, Source::Network);
    assert_eq!(served.response.body_text(), "new");

    // The fresh response replaced the stored one
    let entry = store
      .get(generation.dynamic_bucket(), &request.cache_key())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(entry.response.body_text(), "new");
  }

  #[tokio::test]
  async fn test_offline_serves_previous_response() {
    let generation = Generation::new("playground", "v1");
    let store = SqliteStore::open_in_memory().unwrap();
    let network = ScriptedNetwork::new().route("/api/data", Response::new(200, "payload"));
    let request = Request::get(url("/api/data"));

    network_first(&store, &network, &generation, &request).await;
    network.set_online(false);

    let served = network_first(&store, &network, &generation, &request).await;
    assert!(matches!(served.source, Source::Cache { .. }));
    assert_eq!(served.response.body_text(), "payload");
  }

  #[tokio::test]
  async fn test_offline_api_without_entry_is_503() {
    let generation = Generation::new("playground", "v1");
    let store = SqliteStore::open_in_memory().unwrap();
    let network = ScriptedNetwork::new();
    network.set_online(false);

    let served = network_first(&store, &network, &generation, &Request::get(url("/api/data"))).await;
    assert_eq!(served.source, Source::Offline);
    assert_eq!(served.response.status, 503);
    assert_eq!(served.response.status_text, "Service Unavailable");
  }

  #[tokio::test]
  async fn test_offline_navigation_gets_shell() {
    let generation = Generation::new("playground", "v1");
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .put(
        generation.static_bucket(),
        &Request::get(url("/")).cache_key(),
        &Response::new(200, "<html>shell</html>"),
      )
      .await
      .unwrap();
    let network = ScriptedNetwork::new();
    network.set_online(false);

    let served = network_first(&store, &network, &generation, &Request::navigate(url("/"))).await;
    assert_eq!(served.source, Source::Shell);
    assert_eq!(served.response.body_text(), "<html>shell</html>");
  }

  #[tokio::test]
  async fn test_error_status_falls_back_and_is_not_cached() {
    let generation = Generation::new("playground", "v1");
    let store = SqliteStore::open_in_memory().unwrap();
    let network = ScriptedNetwork::new().route("/api/data", Response::new(500, "boom"));
    let request = Request::get(url("/api/data"));

    let served = network_first(&store, &network, &generation, &request).await;
    assert_eq!(served.source, Source::Offline);
    assert!(!store.has_bucket(generation.dynamic_bucket()).await.unwrap());
  }
}

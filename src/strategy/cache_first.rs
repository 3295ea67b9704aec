use tracing::{debug, warn};

use crate::cache::{CacheStore, Served};
use crate::net::{Network, Request};

/// Serve from `bucket` when present; otherwise fetch, store on success.
///
/// A hit is trusted as-is: no network call, no freshness check.
pub async fn cache_first<S>(
  store: &S,
  network: &dyn Network,
  bucket: &str,
  request: &Request,
) -> Served
where
  S: CacheStore + ?Sized,
{
  let key = request.cache_key();

  match store.get(bucket, &key).await {
    Ok(Some(entry)) => {
      debug!(url = %request.url, "cache hit");
      return Served::from_cache(entry);
    }
    Ok(None) => debug!(url = %request.url, "cache miss"),
    Err(e) => warn!(url = %request.url, error = %e, "cache read failed, treating as miss"),
  }

  match network.fetch_ok(request).await {
    Ok(response) => {
      if let Err(e) = store.put(bucket, &key, &response).await {
        warn!(url = %request.url, error = %e, "failed to cache response");
      }
      Served::from_network(response)
    }
    Err(e) => {
      warn!(url = %request.url, error = %e, "fetch failed");
      Served::offline()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{Source, SqliteStore};
  use crate::net::testing::ScriptedNetwork;
  use crate::net::Response;
  use url::Url;

  const BUCKET: &str = "playground-static-v1";

  fn request(path: &str) -> Request {
    Request::get(Url::parse("http://localhost:8080").unwrap().join(path).unwrap())
  }

  #[tokio::test]
  async fn test_second_request_is_served_without_network() {
    let store = SqliteStore::open_in_memory().unwrap();
    let network = ScriptedNetwork::new().route("/a.css", Response::new(200, "a { }"));

    let first = cache_first(&store, &network, BUCKET, &request("/a.css")).await;
    assert_eq!(first.source, Source::Network);
    assert_eq!(network.calls(), 1);

    let second = cache_first(&store, &network, BUCKET, &request("/a.css")).await;
    assert!(matches!(second.source, Source::Cache { .. }));
    assert_eq!(second.response.body, first.response.body);
    assert_eq!(network.calls(), 1);
  }

  #[tokio::test]
  async fn test_hit_never_touches_network_even_offline() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .put(BUCKET, &request("/a.css").cache_key(), &Response::new(200, "cached"))
      .await
      .unwrap();
    let network = ScriptedNetwork::new();
    network.set_online(false);

    let served = cache_first(&store, &network, BUCKET, &request("/a.css")).await;
    assert_eq!(served.response.body_text(), "cached");
    assert_eq!(network.calls(), 0);
  }

  #[tokio::test]
  async fn test_network_failure_yields_offline_response() {
    let store = SqliteStore::open_in_memory().unwrap();
    let network = ScriptedNetwork::new();
    network.set_online(false);

    let served = cache_first(&store, &network, BUCKET, &request("/a.css")).await;
    assert_eq!(served.source, Source::Offline);
    assert_eq!(served.response.status, 503);
    assert!(!store.has_bucket(BUCKET).await.unwrap());
  }

  #[tokio::test]
  async fn test_unsuccessful_status_is_not_cached() {
    let store = SqliteStore::open_in_memory().unwrap();
    let network = ScriptedNetwork::new();

    let served = cache_first(&store, &network, BUCKET, &request("/missing.png")).await;
    assert_eq!(served.response.status, 503);
    assert!(store
      .get(BUCKET, &request("/missing.png").cache_key())
      .await
      .unwrap()
      .is_none());
  }
}

use color_eyre::{eyre::eyre, Result};
use regex::Regex;
use reqwest::Method;
use url::Url;

use crate::config::RoutingConfig;
use crate::net::Request;

/// How an intercepted request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Not ours: forward to the network unmodified, never cache
  PassThrough,
  CacheFirst,
  NetworkFirst,
}

/// Classifies requests with two ordered pattern tables.
#[derive(Debug, Clone)]
pub struct StrategyRouter {
  origin: Url,
  network_first: Vec<Regex>,
  cache_first: Vec<Regex>,
}

impl StrategyRouter {
  pub fn new(origin: Url, routing: &RoutingConfig) -> Result<Self> {
    Ok(Self {
      origin,
      network_first: compile(&routing.network_first)?,
      cache_first: compile(&routing.cache_first)?,
    })
  }

  /// Pick the strategy for `request`.
  ///
  /// Network-first patterns are consulted before cache-first ones, so
  /// `/api/app.js` is an API call, not a script.
  pub fn classify(&self, request: &Request) -> Strategy {
    if request.method != Method::GET || !request.is_same_origin(&self.origin) {
      return Strategy::PassThrough;
    }

    let path = request.url.path();
    if self.network_first.iter().any(|re| re.is_match(path)) {
      Strategy::NetworkFirst
    } else if self.cache_first.iter().any(|re| re.is_match(path)) {
      Strategy::CacheFirst
    } else {
      Strategy::NetworkFirst
    }
  }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
  patterns
    .iter()
    .map(|p| Regex::new(p).map_err(|e| eyre!("Invalid route pattern '{}': {}", p, e)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn router() -> StrategyRouter {
    let origin = Url::parse("http://localhost:8080").unwrap();
    StrategyRouter::new(origin, &RoutingConfig::default()).unwrap()
  }

  fn get(path: &str) -> Request {
    Request::get(Url::parse("http://localhost:8080").unwrap().join(path).unwrap())
  }

  #[test]
  fn test_non_get_passes_through() {
    let request = get("/api/data").with_method(Method::POST);
    assert_eq!(router().classify(&request), Strategy::PassThrough);

    let request = get("/css/common.css").with_method(Method::DELETE);
    assert_eq!(router().classify(&request), Strategy::PassThrough);
  }

  #[test]
  fn test_cross_origin_passes_through() {
    let request = Request::get(Url::parse("https://cdn.example.com/lib.js").unwrap());
    assert_eq!(router().classify(&request), Strategy::PassThrough);
  }

  #[test]
  fn test_api_and_management_are_network_first() {
    assert_eq!(router().classify(&get("/api/data")), Strategy::NetworkFirst);
    assert_eq!(router().classify(&get("/mngt/menus")), Strategy::NetworkFirst);
  }

  #[test]
  fn test_static_assets_are_cache_first() {
    for path in [
      "/css/common.css",
      "/js/pdf-merge.js",
      "/image/favicon.svg",
      "/image/logo.png",
      "/photo.jpg",
      "/photo.jpeg",
      "/fonts/a.woff",
      "/fonts/a.woff2",
    ] {
      assert_eq!(router().classify(&get(path)), Strategy::CacheFirst, "{}", path);
    }
  }

  #[test]
  fn test_api_pattern_wins_over_asset_extension() {
    assert_eq!(router().classify(&get("/api/bundle.js")), Strategy::NetworkFirst);
    assert_eq!(router().classify(&get("/mngt/theme.css")), Strategy::NetworkFirst);
  }

  #[test]
  fn test_unmatched_defaults_to_network_first() {
    assert_eq!(router().classify(&get("/")), Strategy::NetworkFirst);
    assert_eq!(router().classify(&get("/manifest.json")), Strategy::NetworkFirst);
    assert_eq!(router().classify(&get("/tools/uuid")), Strategy::NetworkFirst);
  }

  #[test]
  fn test_invalid_pattern_is_rejected() {
    let routing = RoutingConfig {
      network_first: vec!["/api/(".to_string()],
      cache_first: Vec::new(),
    };
    let origin = Url::parse("http://localhost:8080").unwrap();
    assert!(StrategyRouter::new(origin, &routing).is_err());
  }
}

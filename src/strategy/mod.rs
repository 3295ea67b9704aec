//! Request classification and the two retrieval strategies.

mod cache_first;
mod fallback;
mod network_first;
mod router;

pub use cache_first::cache_first;
pub use network_first::network_first;
pub use router::{Strategy, StrategyRouter};

use crate::cache::{CacheStore, Generation, Served};
use crate::net::{Network, Request};

/// Route `request` and run the matching executor against `generation`.
///
/// Returns `None` for pass-through requests, which the caller must forward
/// untouched.
pub async fn intercept<S>(
  router: &StrategyRouter,
  store: &S,
  network: &dyn Network,
  generation: &Generation,
  request: &Request,
) -> Option<Served>
where
  S: CacheStore + ?Sized,
{
  let served = match router.classify(request) {
    Strategy::PassThrough => return None,
    Strategy::CacheFirst => {
      cache_first(store, network, generation.static_bucket(), request).await
    }
    Strategy::NetworkFirst => network_first(store, network, generation, request).await,
  };
  Some(served)
}

//! The worker: lifecycle, interception and peripheral hooks behind one handle.

use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use url::Url;

use crate::cache::{CacheStore, Generation, Served};
use crate::config::{Config, NotificationConfig};
use crate::event::{Event, Reply};
use crate::lifecycle::{ActivateError, ActivationReport, CacheLifecycle, InstallOutcome, Phase};
use crate::net::{Network, NetworkError, Request, Response};
use crate::notify::{Notification, SyncRegistry};
use crate::strategy::{self, StrategyRouter};

/// Result of the activation that follows an immediate-rollout install.
pub type Activation = Result<ActivationReport, ActivateError>;

/// Snapshot of the worker's cache state.
#[derive(Debug, Clone)]
pub struct Status {
  pub phase: Phase,
  pub configured: Generation,
  pub active: Option<Generation>,
  pub buckets: Vec<String>,
}

pub struct Worker<S: CacheStore> {
  store: Arc<S>,
  network: Arc<dyn Network>,
  router: StrategyRouter,
  /// Serializes install and activate
  lifecycle: Mutex<CacheLifecycle<S>>,
  /// Generation fetches are served from; write-locked for the whole activation
  active: RwLock<Option<Generation>>,
  sync: SyncRegistry,
  notifications: NotificationConfig,
  origin: Url,
}

impl<S: CacheStore> Worker<S> {
  pub async fn new(store: Arc<S>, network: Arc<dyn Network>, config: &Config) -> Result<Self> {
    let router = StrategyRouter::new(config.origin.clone(), &config.routing)?;
    let lifecycle = CacheLifecycle::resume(store.clone(), config).await?;
    let active = store.active_generation().await?;

    Ok(Self {
      store,
      network,
      router,
      lifecycle: Mutex::new(lifecycle),
      active: RwLock::new(active),
      sync: SyncRegistry::new(&config.sync.tags),
      notifications: config.notifications.clone(),
      origin: config.origin.clone(),
    })
  }

  /// Install the configured generation, activating it straight away when the
  /// rollout policy asks for it.
  ///
  /// An `Err` means nothing was installed. A failed activation after a good
  /// install comes back inside the `Ok` value; the generation stays installed
  /// and `activate` can be retried on its own.
  pub async fn install(&self) -> Result<(InstallOutcome, Option<Activation>)> {
    let mut lifecycle = self.lifecycle.lock().await;
    let outcome = lifecycle.install(self.network.as_ref()).await?;

    let activation = if outcome.promote {
      Some(self.activate_locked(&mut lifecycle).await)
    } else {
      None
    };

    Ok((outcome, activation))
  }

  pub async fn activate(&self) -> Result<ActivationReport, ActivateError> {
    let mut lifecycle = self.lifecycle.lock().await;
    self.activate_locked(&mut lifecycle).await
  }

  async fn activate_locked(
    &self,
    lifecycle: &mut CacheLifecycle<S>,
  ) -> Result<ActivationReport, ActivateError> {
    // Wait for in-flight requests on the old generation before deleting its buckets
    let mut active = self.active.write().await;
    let report = lifecycle.activate().await?;
    *active = Some(lifecycle.generation().clone());
    info!(bucket = lifecycle.generation().static_bucket(), "now serving");
    Ok(report)
  }

  /// Intercept one request. `None` means pass-through.
  ///
  /// Until a generation is active nothing is intercepted. The active
  /// generation stays read-locked for the whole request, so activation cannot
  /// delete its buckets underneath it.
  pub async fn fetch(&self, request: &Request) -> Option<Served> {
    let active = self.active.read().await;
    let generation = active.as_ref()?;

    strategy::intercept(
      &self.router,
      self.store.as_ref(),
      self.network.as_ref(),
      generation,
      request,
    )
    .await
  }

  /// Send a request the worker did not intercept straight to the network,
  /// unmodified and uncached.
  pub async fn forward(&self, request: &Request) -> Result<Served, NetworkError> {
    debug!(method = %request.method, url = %request.url, "passing through");
    self.network.fetch(request).await.map(Served::from_network)
  }

  /// Drop the runtime-cached response for `request` from the active generation.
  pub async fn evict(&self, request: &Request) -> Result<bool> {
    let generation = self.active.read().await.clone();
    match generation {
      Some(generation) => {
        self
          .store
          .delete(generation.dynamic_bucket(), &request.cache_key())
          .await
      }
      None => Ok(false),
    }
  }

  pub async fn status(&self) -> Result<Status> {
    let lifecycle = self.lifecycle.lock().await;
    Ok(Status {
      phase: lifecycle.phase(),
      configured: lifecycle.generation().clone(),
      active: self.active.read().await.clone(),
      buckets: self.store.bucket_names().await?,
    })
  }

  /// Resolve a root-relative path or absolute URL against the origin.
  pub fn resolve(&self, target: &str) -> Result<Url> {
    Ok(self.origin.join(target)?)
  }

  /// Handle one host event.
  pub async fn dispatch(&self, event: Event) -> Result<Reply> {
    let reply = match event {
      Event::Install => {
        let (outcome, activation) = self.install().await?;
        Reply::Installed {
          outcome,
          activation,
        }
      }
      Event::Activate => Reply::Activated(self.activate().await?),
      Event::Fetch(request) => Reply::Fetched(self.fetch(&request).await),
      Event::Sync(tag) => Reply::Synced(self.sync.sync(&tag).await),
      Event::Push(payload) => Reply::Notify(Notification::from_push(&payload, &self.notifications)),
      Event::NotificationClick => Reply::Navigate(Notification::click(&self.origin)),
    };
    Ok(reply)
  }
}

/// Response for a request that could not be answered at all.
pub fn unanswered(error: &NetworkError) -> Response {
  let mut response = Response::offline();
  response.body = format!("Offline: {}", error).into_bytes();
  response
}

//! Install/activate lifecycle for cache generations.

use futures::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

use crate::cache::{CacheStore, Generation, RequestKey};
use crate::config::{Config, Rollout};
use crate::net::{Network, Request, Response};

/// Where the configured generation stands.
///
/// Installing is not a resting phase: `install` holds the manager exclusively
/// and only moves the phase once it has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Uninstalled,
  /// Static bucket populated, not yet serving
  Installed,
  /// Serving fetches
  Active,
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
  /// A manifest asset could not be fetched; nothing was stored.
  #[error("failed to fetch manifest asset {path}: {reason}")]
  Asset { path: String, reason: String },

  #[error("cache store error: {message}")]
  Store { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ActivateError {
  #[error("cannot activate from phase {phase:?}, install first")]
  NotInstalled { phase: Phase },

  #[error("cache store error: {message}")]
  Store { message: String },
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
  pub assets: usize,
  /// Skip waiting: the host should activate right away
  pub promote: bool,
}

/// A stale bucket that could not be deleted during activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
  pub bucket: String,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
  pub deleted: Vec<String>,
  pub failed: Vec<CleanupFailure>,
}

/// Owns one generation's journey from empty to active.
pub struct CacheLifecycle<S: CacheStore> {
  store: Arc<S>,
  generation: Generation,
  origin: Url,
  manifest: Vec<String>,
  rollout: Rollout,
  phase: Phase,
}

impl<S: CacheStore> CacheLifecycle<S> {
  /// Pick up wherever a previous run left the configured generation.
  pub async fn resume(store: Arc<S>, config: &Config) -> color_eyre::Result<Self> {
    let generation = config.generation();

    let phase = if store.active_generation().await?.as_ref() == Some(&generation) {
      Phase::Active
    } else if store.has_bucket(generation.static_bucket()).await? {
      Phase::Installed
    } else {
      Phase::Uninstalled
    };

    Ok(Self {
      store,
      generation,
      origin: config.origin.clone(),
      manifest: config.manifest.clone(),
      rollout: config.rollout,
      phase,
    })
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn generation(&self) -> &Generation {
    &self.generation
  }

  /// Fetch every manifest asset and store them in the static bucket.
  ///
  /// All-or-nothing: entries are only written once every asset has been
  /// fetched successfully, in a single store transaction. On failure, or if
  /// the future is dropped early, the manager is left as it was and the
  /// install can be retried from scratch.
  pub async fn install(&mut self, network: &dyn Network) -> Result<InstallOutcome, InstallError> {
    info!(
      bucket = self.generation.static_bucket(),
      assets = self.manifest.len(),
      "installing"
    );

    match self.populate(network).await {
      Ok(assets) => {
        if self.phase != Phase::Active {
          self.phase = Phase::Installed;
        }
        info!(bucket = self.generation.static_bucket(), assets, "installed");
        Ok(InstallOutcome {
          assets,
          promote: self.rollout == Rollout::Immediate,
        })
      }
      Err(e) => {
        error!(bucket = self.generation.static_bucket(), error = %e, "install failed");
        Err(e)
      }
    }
  }

  async fn populate(&self, network: &dyn Network) -> Result<usize, InstallError> {
    let requests = self
      .manifest
      .iter()
      .map(|path| {
        self
          .origin
          .join(path)
          .map(|url| (path.as_str(), Request::get(url)))
          .map_err(|e| InstallError::Asset {
            path: path.clone(),
            reason: e.to_string(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    let entries: Vec<(RequestKey, Response)> =
      try_join_all(requests.iter().map(|(path, request)| async move {
        network
          .fetch_ok(request)
          .await
          .map(|response| (request.cache_key(), response))
          .map_err(|e| InstallError::Asset {
            path: path.to_string(),
            reason: e.to_string(),
          })
      }))
      .await?;

    self
      .store
      .put_all(self.generation.static_bucket(), &entries)
      .await
      .map_err(|e| InstallError::Store {
        message: e.to_string(),
      })?;

    Ok(entries.len())
  }

  /// Delete every bucket this generation does not own, then claim control.
  ///
  /// A bucket that fails to delete is logged and reported, and the rest are
  /// still processed. Running this twice is harmless.
  pub async fn activate(&mut self) -> Result<ActivationReport, ActivateError> {
    if !matches!(self.phase, Phase::Installed | Phase::Active) {
      return Err(ActivateError::NotInstalled { phase: self.phase });
    }
    info!(bucket = self.generation.static_bucket(), "activating");

    let stale: Vec<String> = self
      .store
      .bucket_names()
      .await
      .map_err(|e| ActivateError::Store {
        message: e.to_string(),
      })?
      .into_iter()
      .filter(|name| !self.generation.owns(name))
      .collect();

    let results = join_all(stale.iter().map(|name| self.store.delete_bucket(name))).await;

    let mut report = ActivationReport::default();
    for (bucket, result) in stale.into_iter().zip(results) {
      match result {
        Ok(_) => {
          info!(bucket = %bucket, "deleted old cache");
          report.deleted.push(bucket);
        }
        Err(e) => {
          warn!(bucket = %bucket, error = %e, "failed to delete old cache");
          report.failed.push(CleanupFailure {
            bucket,
            message: e.to_string(),
          });
        }
      }
    }

    // Claim: from here on every consumer is served by this generation
    self
      .store
      .set_active_generation(&self.generation)
      .await
      .map_err(|e| ActivateError::Store {
        message: e.to_string(),
      })?;
    self.phase = Phase::Active;

    Ok(report)
  }
}

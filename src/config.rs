use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::cache::Generation;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Origin of the application; only same-origin requests are intercepted
  pub origin: Url,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Root-relative paths pre-populated into the static bucket at install
  #[serde(default = "default_manifest")]
  pub manifest: Vec<String>,
  #[serde(default)]
  pub routing: RoutingConfig,
  #[serde(default)]
  pub rollout: Rollout,
  #[serde(default)]
  pub network: NetworkConfig,
  #[serde(default)]
  pub notifications: NotificationConfig,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_prefix")]
  pub prefix: String,
  /// Bumped on every deployment; changes both bucket names
  #[serde(default = "default_version")]
  pub version: String,
  /// SQLite file (default: $XDG_DATA_HOME/swcache/cache.db)
  pub database: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      prefix: default_prefix(),
      version: default_version(),
      database: None,
    }
  }
}

/// Ordered regex tables, matched against the URL path.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
  #[serde(default = "default_network_first")]
  pub network_first: Vec<String>,
  #[serde(default = "default_cache_first")]
  pub cache_first: Vec<String>,
}

impl Default for RoutingConfig {
  fn default() -> Self {
    Self {
      network_first: default_network_first(),
      cache_first: default_cache_first(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rollout {
  /// Activate right after install and take over running sessions. A session
  /// may briefly see a mix of old and new assets.
  #[default]
  Immediate,
  /// Leave the new generation installed but waiting; the host activates it
  /// once sessions on the old generation are gone.
  Drain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
  #[serde(default = "default_title")]
  pub title: String,
  #[serde(default = "default_body")]
  pub default_body: String,
  #[serde(default = "default_icon")]
  pub icon: String,
  #[serde(default = "default_badge")]
  pub badge: String,
  #[serde(default = "default_vibrate")]
  pub vibrate: Vec<u32>,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      title: default_title(),
      default_body: default_body(),
      icon: default_icon(),
      badge: default_badge(),
      vibrate: default_vibrate(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Tags the resync entry point answers to
  #[serde(default = "default_sync_tags")]
  pub tags: Vec<String>,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      tags: default_sync_tags(),
    }
  }
}

fn default_prefix() -> String {
  "playground".to_string()
}

fn default_version() -> String {
  "v1".to_string()
}

fn default_manifest() -> Vec<String> {
  [
    "/",
    "/css/common.css",
    "/css/home.css",
    "/css/tool-page.css",
    "/css/pdf-merge.css",
    "/js/pdf-merge.js",
    "/image/favicon.svg",
    "/manifest.json",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

fn default_network_first() -> Vec<String> {
  vec![r"/api/".to_string(), r"/mngt/".to_string()]
}

fn default_cache_first() -> Vec<String> {
  [
    r"\.css$",
    r"\.js$",
    r"\.png$",
    r"\.jpg$",
    r"\.jpeg$",
    r"\.svg$",
    r"\.woff2?$",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

fn default_timeout_secs() -> u64 {
  10
}

fn default_title() -> String {
  "Playground".to_string()
}

fn default_body() -> String {
  "New notification".to_string()
}

fn default_icon() -> String {
  "/image/icon-192x192.png".to_string()
}

fn default_badge() -> String {
  "/image/icon-72x72.png".to_string()
}

fn default_vibrate() -> Vec<u32> {
  vec![200, 100, 200]
}

fn default_sync_tags() -> Vec<String> {
  vec!["sync-data".to_string()]
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./swcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/swcache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/swcache/config.yaml\n\
                 At minimum it must set `origin`."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("swcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("swcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.validate()?;
    Ok(config)
  }

  /// Reject configurations the offline fallback could not work with.
  pub fn validate(&self) -> Result<()> {
    if self.origin.host_str().is_none() {
      return Err(eyre!("origin must include a host: {}", self.origin));
    }

    if let Some(bad) = self.manifest.iter().find(|p| !p.starts_with('/')) {
      return Err(eyre!("manifest paths must be root-relative: {}", bad));
    }

    // The offline navigation fallback serves the cached root document
    if !self.manifest.iter().any(|p| p == "/") {
      return Err(eyre!("manifest must include the root document \"/\""));
    }

    if self.cache.prefix.is_empty() || self.cache.version.is_empty() {
      return Err(eyre!("cache prefix and version must not be empty"));
    }

    Ok(())
  }

  /// Bucket names for the configured deployment.
  pub fn generation(&self) -> Generation {
    Generation::new(&self.cache.prefix, &self.cache.version)
  }
}

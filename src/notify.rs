//! Background resync trigger and push notification mapping.
//!
//! Both are integration points for the host runtime: the data-sync logic
//! itself lives elsewhere.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use url::Url;

use crate::config::NotificationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// Task ran; `runs` counts every run since startup, this one included
  Ran { runs: u64 },
  /// Tag is not registered; nothing happened
  Ignored,
}

/// Named resync entry points, invoked when connectivity returns.
#[derive(Debug)]
pub struct SyncRegistry {
  tags: BTreeSet<String>,
  runs: AtomicU64,
}

impl SyncRegistry {
  pub fn new(tags: &[String]) -> Self {
    Self {
      tags: tags.iter().cloned().collect(),
      runs: AtomicU64::new(0),
    }
  }

  /// Run the task registered under `tag`. Safe to call any number of times.
  pub async fn sync(&self, tag: &str) -> SyncOutcome {
    if !self.tags.contains(tag) {
      info!(tag, "ignoring unknown sync tag");
      return SyncOutcome::Ignored;
    }

    let runs = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
    info!(tag, runs, "syncing data");
    SyncOutcome::Ran { runs }
  }
}

/// Inbound push message. Payloads without data still raise a notification.
#[derive(Debug, Clone, Default)]
pub struct PushPayload {
  pub text: Option<String>,
}

/// A user-visible notification built from a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub vibrate: Vec<u32>,
}

impl Notification {
  pub fn from_push(payload: &PushPayload, config: &NotificationConfig) -> Self {
    info!("push notification received");
    Self {
      title: config.title.clone(),
      body: payload
        .text
        .clone()
        .unwrap_or_else(|| config.default_body.clone()),
      icon: config.icon.clone(),
      badge: config.badge.clone(),
      vibrate: config.vibrate.clone(),
    }
  }

  /// Where a click on any notification navigates: always the application root.
  pub fn click(origin: &Url) -> Url {
    info!("notification clicked");
    let mut root = origin.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
  }
}

use url::Url;

use crate::cache::Served;
use crate::lifecycle::{ActivationReport, InstallOutcome};
use crate::worker::Activation;
use crate::net::Request;
use crate::notify::{Notification, PushPayload, SyncOutcome};

/// Events the host runtime delivers to the worker
#[derive(Debug)]
pub enum Event {
  Install,
  Activate,
  /// Outgoing request to intercept
  Fetch(Request),
  /// Connectivity restored; run the named resync task
  Sync(String),
  Push(PushPayload),
  NotificationClick,
}

/// What the worker hands back for each event
#[derive(Debug)]
pub enum Reply {
  Installed {
    outcome: InstallOutcome,
    /// Present when the rollout policy activated right after install
    activation: Option<Activation>,
  },
  Activated(ActivationReport),
  /// `None` means the request was not intercepted
  Fetched(Option<Served>),
  Synced(SyncOutcome),
  Notify(Notification),
  Navigate(Url),
}

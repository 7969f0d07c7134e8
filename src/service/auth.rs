use super::SharedApi;
use crate::config::CapabilityNames;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const RETRY_AFTER_FAILURE: Duration = Duration::from_secs(30);

/// Host list actions that require a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageHosts,
    Wake,
}

impl Action {
    pub fn capability(self, names: &CapabilityNames) -> &str {
        match self {
            Action::ManageHosts => &names.manage_hosts,
            Action::Wake => &names.wake,
        }
    }
}

/// Capability set of the signed-in user, valid for a limited time.
#[derive(Debug, Clone)]
pub struct AuthContext {
    capabilities: HashSet<String>,
    obtained_at: Instant,
    ttl: Duration,
}

impl AuthContext {
    pub fn new<I, S>(capabilities: I, ttl: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            obtained_at: Instant::now(),
            ttl,
        }
    }

    pub fn has(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.obtained_at) >= self.ttl
    }

    pub fn allows_at(&self, action: Action, names: &CapabilityNames, now: Instant) -> bool {
        !self.is_expired_at(now) && self.has(action.capability(names))
    }
}

/// Latest authorization context. `None` until the first lookup completes.
pub type Authorization = watch::Receiver<Option<AuthContext>>;

/// An authorization that is already resolved and never refreshed.
pub fn fixed(context: AuthContext) -> Authorization {
    let (_tx, rx) = watch::channel(Some(context));
    rx
}

/// Resolves the capability set in the background and refreshes it before it
/// expires. Failed lookups keep the previous context and retry later.
pub fn spawn_resolver(api: SharedApi, ttl: Duration, handle: &Handle) -> (Authorization, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);
    let task = handle.spawn(async move {
        loop {
            let wait = match api.current_capabilities().await {
                Ok(capabilities) => {
                    debug!(count = capabilities.len(), "capabilities resolved");
                    tx.send_replace(Some(AuthContext::new(capabilities, ttl)));
                    // Refresh a little before the context runs out
                    ttl.mul_f32(0.8).max(Duration::from_secs(1))
                }
                Err(e) => {
                    warn!("Unable to resolve capabilities: {}", e);
                    RETRY_AFTER_FAILURE
                }
            };
            if tx.is_closed() {
                break;
            }
            tokio::time::sleep(wait).await;
        }
    });
    (rx, task)
}

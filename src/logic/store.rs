use crate::error::{Error, Result};
use crate::model::{HostFields, HostRecord};
use crate::service::SharedApi;
use super::lock;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a wake request. `Sent` only means the packet went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    Sent,
    PermissionDenied,
    Failed(String),
}

#[derive(Debug, Default)]
struct HostCache {
    hosts: Vec<HostRecord>,
    /// Generation of the newest refresh that was started
    started: u64,
    /// Set once the backend reported that it has no host collection
    unavailable: bool,
}

/// Cached view of the remote host collection.
///
/// Cloning is cheap; clones share the cache and the subscriber channel.
#[derive(Clone)]
pub struct HostStore {
    api: SharedApi,
    cache: Arc<Mutex<HostCache>>,
    revision: Arc<watch::Sender<u64>>,
    handle: Handle,
}

impl HostStore {
    pub fn new(api: SharedApi, handle: Handle) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            cache: Arc::new(Mutex::new(HostCache::default())),
            revision: Arc::new(revision),
            handle,
        }
    }

    fn cache(&self) -> MutexGuard<'_, HostCache> {
        lock(&self.cache)
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Receives a new revision number every time the cache changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn api(&self) -> &SharedApi {
        &self.api
    }

    /// Cached hosts, without triggering a refresh.
    pub fn cached(&self) -> Vec<HostRecord> {
        self.cache().hosts.clone()
    }

    pub fn get(&self, key: &str) -> Option<HostRecord> {
        self.cache().hosts.iter().find(|h| h.key() == Some(key)).cloned()
    }

    /// False when the backend has no host collection to store hosts in.
    pub fn is_available(&self) -> bool {
        !self.cache().unavailable
    }

    /// Returns the cached hosts and starts a refresh in the background.
    pub fn list(&self) -> Vec<HostRecord> {
        let hosts = self.cached();
        self.spawn_refresh();
        hosts
    }

    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        let store = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = store.refresh().await {
                warn!("Unable to fetch the hosts: {}", e);
            }
        })
    }

    /// Fetches the collection and replaces the cache.
    ///
    /// Returns `Ok(false)` when a newer refresh started while this one was in
    /// flight; its result is dropped so the newest request always wins.
    pub async fn refresh(&self) -> Result<bool> {
        let generation = {
            let mut cache = self.cache();
            cache.started += 1;
            cache.started
        };

        let result = self.api.list_hosts().await;

        {
            let mut cache = self.cache();
            if generation != cache.started {
                debug!(generation, newest = cache.started, "discarding superseded host list");
                return Ok(false);
            }
            match result {
                Ok(hosts) => {
                    debug!(count = hosts.len(), "retrieved the list of hosts");
                    cache.hosts = hosts;
                    cache.unavailable = false;
                }
                Err(e) if e.is_not_found() => {
                    debug!("host collection not available, showing no hosts");
                    cache.hosts.clear();
                    cache.unavailable = true;
                }
                Err(e) => return Err(e),
            }
        }
        self.notify();
        Ok(true)
    }

    pub async fn create(&self, fields: HostFields) -> Result<HostRecord> {
        let key = self.api.create_host(&fields).await?;
        info!(key = %key, name = %fields.name, "host created");
        Ok(HostRecord::new(&key, fields))
    }

    /// Replaces all four fields of the record with `key`.
    pub async fn update(&self, key: &str, fields: HostFields) -> Result<HostRecord> {
        if self.get(key).is_none() {
            return Err(Error::not_found("host", key));
        }
        self.api.update_host(key, &fields).await?;
        info!(key, "host saved");

        let record = HostRecord::new(key, fields);
        let replaced = {
            let mut cache = self.cache();
            // The host may have been deleted while the update was in flight
            match cache.hosts.iter_mut().find(|h| h.key() == Some(key)) {
                Some(cached) => {
                    *cached = record.clone();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.notify();
        }
        Ok(record)
    }

    /// Deletes the record. Call [`refresh`](Self::refresh) afterwards; the
    /// cache is left untouched.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.api.delete_host(key).await?;
        info!(key, "host deleted");
        Ok(())
    }

    pub async fn wake(&self, host_name: &str) -> WakeOutcome {
        match self.api.wake(host_name).await {
            Ok(response) if response.success => {
                info!(host = host_name, mac = ?response.mac_address, "wake-on-lan packet sent");
                WakeOutcome::Sent
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Wake-on-LAN request failed".to_string());
                warn!(host = host_name, "wake-on-lan request failed: {}", message);
                WakeOutcome::Failed(message)
            }
            Err(e) if e.is_permission_denied() => {
                info!(host = host_name, "inadequate permissions to wake host");
                WakeOutcome::PermissionDenied
            }
            Err(e) => {
                warn!(host = host_name, "wake-on-lan request failed: {}", e);
                WakeOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

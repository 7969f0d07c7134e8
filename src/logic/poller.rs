use super::lock;
use super::store::HostStore;
use crate::model::{HostRecord, StatusTracker};
use crate::service::SharedApi;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub type SharedTracker = Arc<Mutex<StatusTracker>>;

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(20_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Clears the in-flight flag when the probe task ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps host reachability approximately fresh, one probe at a time.
///
/// Each tick walks the hosts round-robin, starting after the host probed last,
/// and probes the first one whose status is stale. While a probe is in flight
/// ticks do nothing, so large host lists take longer to refresh but the
/// backend never sees more than one outstanding ping from us.
pub struct Poller {
    api: SharedApi,
    tracker: SharedTracker,
    in_flight: Arc<AtomicBool>,
    /// Identity of the host probed last
    cursor: Option<String>,
    stale_after: Duration,
    handle: Handle,
}

impl Poller {
    pub fn new(api: SharedApi, tracker: SharedTracker, stale_after: Duration, handle: Handle) -> Self {
        Self {
            api,
            tracker,
            in_flight: Arc::new(AtomicBool::new(false)),
            cursor: None,
            stale_after,
            handle,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Index of the next host to probe in `hosts`, if any is stale.
    pub fn select_next(&self, hosts: &[HostRecord]) -> Option<usize> {
        if hosts.is_empty() {
            return None;
        }
        let start = self
            .cursor
            .as_deref()
            .and_then(|id| hosts.iter().position(|h| host_id(h) == id))
            .map_or(0, |i| i + 1);

        let tracker = lock(&self.tracker);
        let now = Utc::now();
        (0..hosts.len())
            .map(|offset| (start + offset) % hosts.len())
            .find(|&i| tracker.needs_check_at(hosts[i].ip_address(), self.stale_after, now))
    }

    /// Starts a probe for the next stale host. Returns `None` when a probe is
    /// already running or every host is fresh.
    pub fn tick(&mut self, hosts: &[HostRecord]) -> Option<JoinHandle<()>> {
        if self.is_in_flight() {
            return None;
        }
        let index = self.select_next(hosts)?;
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        let host = &hosts[index];
        self.cursor = Some(host_id(host).to_string());
        let address = host.ip_address().to_string();
        let guard = InFlight(self.in_flight.clone());
        let api = self.api.clone();
        let tracker = self.tracker.clone();

        debug!(address = %address, "probing host");
        Some(self.handle.spawn(async move {
            let _guard = guard;
            probe(api, tracker, address).await;
        }))
    }

    /// Ticks every `period` over the store's cached host list.
    pub async fn run(mut self, store: HostStore, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let hosts = store.cached();
            self.tick(&hosts);
        }
    }
}

fn host_id(host: &HostRecord) -> &str {
    host.key().unwrap_or_else(|| host.ip_address())
}

async fn probe(api: SharedApi, tracker: SharedTracker, address: String) {
    match api.ping(&address).await {
        Ok(response) => {
            let online = response.is_reachable();
            debug!(address = %address, online, return_code = ?response.return_code, "probe finished");
            let mut tracker = lock(&tracker);
            tracker.record_probe_at(&address, online, response.details(), Utc::now());
        }
        // Left unknown; the next tick sees it is still stale and tries again
        Err(e) => warn!(address = %address, "reachability probe failed: {}", e),
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;

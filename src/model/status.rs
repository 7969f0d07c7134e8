use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reachability {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl Reachability {
    pub fn from_online(online: bool) -> Self {
        if online {
            Reachability::Online
        } else {
            Reachability::Offline
        }
    }
}

/// Last known reachability of one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// When the last probe for this address completed
    pub last_checked: DateTime<Utc>,
    pub online: Reachability,
    /// Average round-trip time reported by the last probe, in milliseconds
    #[serde(default)]
    pub latency: Option<f64>,
    /// Packet loss reported by the last probe, in percent
    #[serde(default)]
    pub packet_loss: Option<f64>,
}

/// Extra measurements that may accompany a probe result.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeDetails {
    pub latency: Option<f64>,
    pub packet_loss: Option<f64>,
}

/// Map from host address to the last probe result.
///
/// Entries are never removed. When a host is deleted its entry is simply not
/// looked up again, since every read goes through the current host list.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    entries: HashMap<String, StatusEntry>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ip: &str) -> Option<&StatusEntry> {
        self.entries.get(ip)
    }

    pub fn reachability(&self, ip: &str) -> Reachability {
        self.get(ip).map(|e| e.online).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_result(&mut self, ip: &str, online: bool) {
        self.record_result_at(ip, online, Utc::now());
    }

    pub fn record_result_at(&mut self, ip: &str, online: bool, now: DateTime<Utc>) {
        self.record_probe_at(ip, online, ProbeDetails::default(), now);
    }

    /// Overwrites the entry for `ip`. The timestamp never moves backwards, even
    /// if the wall clock does.
    pub fn record_probe_at(
        &mut self,
        ip: &str,
        online: bool,
        details: ProbeDetails,
        now: DateTime<Utc>,
    ) {
        let last_checked = match self.entries.get(ip) {
            Some(previous) => previous.last_checked.max(now),
            None => now,
        };
        self.entries.insert(
            ip.to_string(),
            StatusEntry {
                last_checked,
                online: Reachability::from_online(online),
                latency: details.latency,
                packet_loss: details.packet_loss,
            },
        );
    }

    pub fn needs_check(&self, ip: &str, stale_after: Duration) -> bool {
        self.needs_check_at(ip, stale_after, Utc::now())
    }

    /// Hosts without an address are never scheduled; they stay unknown.
    pub fn needs_check_at(&self, ip: &str, stale_after: Duration, now: DateTime<Utc>) -> bool {
        if ip.trim().is_empty() {
            return false;
        }
        match self.entries.get(ip) {
            None => true,
            Some(entry) => {
                let age_ms = now
                    .signed_duration_since(entry.last_checked)
                    .num_milliseconds();
                age_ms >= 0 && age_ms as u128 >= stale_after.as_millis()
            }
        }
    }
}

/// Display band for a round-trip time, matching the dashboard's stopwatch icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyBand {
    /// Response percentile bucket: 0, 25, 50, 75 or 100
    Response(u8),
    Failure,
}

pub fn latency_band(ms: f64) -> LatencyBand {
    if ms.is_nan() || ms >= 1000.0 {
        LatencyBand::Failure
    } else if ms <= 100.0 {
        LatencyBand::Response(0)
    } else if ms <= 250.0 {
        LatencyBand::Response(25)
    } else if ms <= 500.0 {
        LatencyBand::Response(50)
    } else if ms <= 750.0 {
        LatencyBand::Response(75)
    } else {
        LatencyBand::Response(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossBand {
    Success,
    Warning,
    Failure,
}

pub fn loss_band(percent: f64) -> LossBand {
    if percent == 0.0 {
        LossBand::Success
    } else if percent <= 10.0 {
        LossBand::Warning
    } else {
        LossBand::Failure
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

//! Console configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Console configuration, read from `<config dir>/wol_hosts/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Management API base URL (host collection, authentication)
    pub management_url: String,

    /// Web tier base URL hosting the app's custom controller (wake, ping)
    pub web_url: String,

    /// Locale segment used in web tier paths
    pub locale: String,

    pub app: String,
    pub owner: String,
    pub collection: String,

    /// Session key or authentication token
    pub token: Option<String>,

    /// Accept self-signed certificates on the management port
    pub accept_invalid_certs: bool,

    pub request_timeout_secs: u64,

    /// Period of the reachability poller
    pub poll_interval_ms: u64,

    /// Age after which a host's status is probed again
    pub stale_after_ms: u64,

    /// How long success and failure banners stay visible
    pub banner_display_ms: u64,

    pub page_size: usize,

    /// Lifetime of a resolved capability set
    pub auth_ttl_secs: u64,

    pub capabilities: CapabilityNames,

    /// Run against an in-memory backend instead of the REST endpoints
    pub offline: bool,
}

/// Capabilities that unlock the host list actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityNames {
    pub manage_hosts: String,
    pub wake: String,
}

impl Default for CapabilityNames {
    fn default() -> Self {
        Self {
            manage_hosts: "edit_network_hosts".to_string(),
            wake: "wake_on_lan".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            management_url: "https://localhost:8089".to_string(),
            web_url: "http://localhost:8000".to_string(),
            locale: "en-US".to_string(),
            app: "network_tools".to_string(),
            owner: "nobody".to_string(),
            collection: "network_hosts".to_string(),
            token: None,
            accept_invalid_certs: true,
            request_timeout_secs: 30,
            poll_interval_ms: 1_000,
            stale_after_ms: 20_000,
            banner_display_ms: 5_000,
            page_size: 25,
            auth_ttl_secs: 300,
            capabilities: CapabilityNames::default(),
            offline: false,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wol_hosts").join("config.json"))
    }

    /// Loads the config file if present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("WOL_HOSTS_MANAGEMENT_URL") {
            self.management_url = url;
        }
        if let Some(url) = lookup("WOL_HOSTS_WEB_URL") {
            self.web_url = url;
        }
        if let Some(token) = lookup("WOL_HOSTS_TOKEN").filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        if let Some(offline) = lookup("WOL_HOSTS_OFFLINE") {
            self.offline = matches!(offline.as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("management_url", &self.management_url), ("web_url", &self.web_url)] {
            reqwest::Url::parse(url)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", name, e)))?;
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("poll_interval_ms must be positive".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    pub fn banner_display(&self) -> Duration {
        Duration::from_millis(self.banner_display_ms)
    }

    pub fn auth_ttl(&self) -> Duration {
        Duration::from_secs(self.auth_ttl_secs)
    }
}

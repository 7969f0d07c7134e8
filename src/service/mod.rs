//! Remote endpoints used by the host list: the host collection, the wake and
//! ping controller, and the authentication context.

pub mod auth;
pub mod http;
pub mod memory;

use crate::error::Result;
use crate::model::{HostFields, HostRecord, ProbeDetails};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

pub use auth::{Action, AuthContext, Authorization};
pub use http::HttpApi;
pub use memory::{ApiCall, MemoryApi};

/// Response of the ping controller endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PingResponse {
    #[serde(default)]
    pub success: bool,
    /// Exit code of the ping command; 0 means the host answered
    #[serde(default, deserialize_with = "lenient_i64")]
    pub return_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_ping: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub packet_loss: Option<f64>,
}

impl PingResponse {
    pub fn with_return_code(code: i64) -> Self {
        Self {
            success: true,
            return_code: Some(code),
            ..Self::default()
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.return_code == Some(0)
    }

    pub fn details(&self) -> ProbeDetails {
        ProbeDetails {
            latency: self.avg_ping,
            packet_loss: self.packet_loss,
        }
    }
}

/// Response of the wake controller endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WakeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
}

impl WakeResponse {
    pub fn sent(mac_address: &str) -> Self {
        Self {
            success: true,
            message: Some("Wake-on-LAN request successfully sent".to_string()),
            mac_address: Some(mac_address.to_string()),
        }
    }
}

#[async_trait]
pub trait NetworkToolsApi: Send + Sync {
    /// Lists the host collection. A missing collection is `Error::NotFound`.
    async fn list_hosts(&self) -> Result<Vec<HostRecord>>;

    /// Stores a new host and returns its key.
    async fn create_host(&self, fields: &HostFields) -> Result<String>;

    async fn update_host(&self, key: &str, fields: &HostFields) -> Result<()>;

    async fn delete_host(&self, key: &str) -> Result<()>;

    async fn wake(&self, host_name: &str) -> Result<WakeResponse>;

    async fn ping(&self, address: &str) -> Result<PingResponse>;

    async fn current_capabilities(&self) -> Result<Vec<String>>;
}

pub type SharedApi = Arc<dyn NetworkToolsApi>;

// The backend reports parsed ping figures as strings or numbers depending on
// the platform, and sometimes as empty strings.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

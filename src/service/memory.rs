//! In-memory backend, used for offline mode and tests

use super::{NetworkToolsApi, PingResponse, WakeResponse};
use crate::error::{Error, Result};
use crate::model::{HostFields, HostRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

/// A request received by [`MemoryApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    List,
    Create(HostFields),
    Update(String, HostFields),
    Delete(String),
    Wake(String),
    Ping(String),
    Capabilities,
}

#[derive(Debug)]
enum PingScript {
    Respond(PingResponse),
    Status(u16),
}

#[derive(Debug)]
struct Inner {
    hosts: Vec<HostRecord>,
    next_key: u64,
    calls: Vec<ApiCall>,
    list_status: Option<u16>,
    wake_status: Option<u16>,
    wake_failure: Option<String>,
    pings: HashMap<String, PingScript>,
    capabilities: Vec<String>,
    ping_gate: Option<Arc<Semaphore>>,
    list_gate: Option<Arc<Semaphore>>,
}

#[derive(Debug)]
pub struct MemoryApi {
    inner: Mutex<Inner>,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryApi {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                hosts: Vec::new(),
                next_key: 1,
                calls: Vec::new(),
                list_status: None,
                wake_status: None,
                wake_failure: None,
                pings: HashMap::new(),
                capabilities: Vec::new(),
                ping_gate: None,
                list_gate: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_hosts(self, hosts: Vec<HostRecord>) -> Self {
        self.lock().hosts = hosts;
        self
    }

    pub fn with_capabilities(self, capabilities: &[&str]) -> Self {
        self.lock().capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn hosts(&self) -> Vec<HostRecord> {
        self.lock().hosts.clone()
    }

    /// Makes the list endpoint answer with an HTTP error status.
    pub fn set_list_status(&self, status: Option<u16>) {
        self.lock().list_status = status;
    }

    pub fn set_wake_status(&self, status: Option<u16>) {
        self.lock().wake_status = status;
    }

    /// Makes the wake endpoint answer `success: false` with `message`.
    pub fn set_wake_failure(&self, message: Option<&str>) {
        self.lock().wake_failure = message.map(str::to_string);
    }

    pub fn set_ping_response(&self, address: &str, response: PingResponse) {
        self.lock()
            .pings
            .insert(address.to_string(), PingScript::Respond(response));
    }

    pub fn set_ping_status(&self, address: &str, status: u16) {
        self.lock()
            .pings
            .insert(address.to_string(), PingScript::Status(status));
    }

    /// Holds every ping until [`release_pings`](Self::release_pings) lets it through.
    pub fn hold_pings(&self) {
        self.lock().ping_gate = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_pings(&self, count: usize) {
        if let Some(gate) = &self.lock().ping_gate {
            gate.add_permits(count);
        }
    }

    /// Holds list responses; the hosts are read before waiting, so a held
    /// response carries the collection as it was when requested.
    pub fn hold_lists(&self) {
        self.lock().list_gate = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_lists(&self, count: usize) {
        if let Some(gate) = &self.lock().list_gate {
            gate.add_permits(count);
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, ApiCall::List)).count()
    }

    pub fn pinged(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Ping(address) => Some(address),
                _ => None,
            })
            .collect()
    }

    fn status_error(status: u16, context: &str) -> Error {
        let status = reqwest::StatusCode::from_u16(status)
            .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        Error::from_status(status, context)
    }
}

#[async_trait]
impl NetworkToolsApi for MemoryApi {
    async fn list_hosts(&self) -> Result<Vec<HostRecord>> {
        let (result, gate) = {
            let mut inner = self.lock();
            inner.calls.push(ApiCall::List);
            let result = match inner.list_status {
                Some(status) => Err(Self::status_error(status, "list hosts")),
                None => Ok(inner.hosts.clone()),
            };
            (result, inner.list_gate.clone())
        };
        if let Some(gate) = gate {
            pass_gate(&gate).await;
        }
        result
    }

    async fn create_host(&self, fields: &HostFields) -> Result<String> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Create(fields.clone()));
        let key = format!("{:024x}", inner.next_key);
        inner.next_key += 1;
        inner.hosts.push(HostRecord::new(&key, fields.clone()));
        Ok(key)
    }

    async fn update_host(&self, key: &str, fields: &HostFields) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Update(key.to_string(), fields.clone()));
        match inner.hosts.iter_mut().find(|h| h.key() == Some(key)) {
            Some(host) => {
                host.fields = fields.clone();
                Ok(())
            }
            None => Err(Error::not_found("host", key)),
        }
    }

    async fn delete_host(&self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Delete(key.to_string()));
        let before = inner.hosts.len();
        inner.hosts.retain(|h| h.key() != Some(key));
        if inner.hosts.len() == before {
            return Err(Error::not_found("host", key));
        }
        Ok(())
    }

    async fn wake(&self, host_name: &str) -> Result<WakeResponse> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Wake(host_name.to_string()));
        if let Some(status) = inner.wake_status {
            return Err(Self::status_error(status, "wake"));
        }
        if let Some(message) = &inner.wake_failure {
            return Ok(WakeResponse {
                success: false,
                message: Some(message.clone()),
                mac_address: None,
            });
        }
        match inner.hosts.iter().find(|h| h.name() == host_name) {
            Some(host) => Ok(WakeResponse::sent(host.mac_address())),
            None => Ok(WakeResponse {
                success: false,
                message: Some(
                    "No MAC address was provided and unable to resolve one from the hosts table"
                        .to_string(),
                ),
                mac_address: None,
            }),
        }
    }

    async fn ping(&self, address: &str) -> Result<PingResponse> {
        let gate = {
            let mut inner = self.lock();
            inner.calls.push(ApiCall::Ping(address.to_string()));
            inner.ping_gate.clone()
        };
        if let Some(gate) = gate {
            pass_gate(&gate).await;
        }
        match self.lock().pings.get(address) {
            Some(PingScript::Respond(response)) => Ok(response.clone()),
            Some(PingScript::Status(status)) => Err(Self::status_error(*status, "ping")),
            None => Ok(PingResponse::with_return_code(0)),
        }
    }

    async fn current_capabilities(&self) -> Result<Vec<String>> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Capabilities);
        Ok(inner.capabilities.clone())
    }
}

async fn pass_gate(gate: &Semaphore) {
    // A closed semaphore just lets the request through
    if let Ok(permit) = gate.acquire().await {
        permit.forget();
    }
}

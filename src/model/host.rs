use serde::{Deserialize, Serialize};

/// The four user-editable fields of a host record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub port: String,
}

impl HostFields {
    pub fn new(name: &str, ip_address: &str, mac_address: &str, port: &str) -> Self {
        Self {
            name: name.to_string(),
            ip_address: ip_address.to_string(),
            mac_address: mac_address.to_string(),
            port: port.to_string(),
        }
    }

    pub fn get(&self, field: HostField) -> &str {
        match field {
            HostField::Name => &self.name,
            HostField::IpAddress => &self.ip_address,
            HostField::MacAddress => &self.mac_address,
            HostField::Port => &self.port,
        }
    }

    pub fn get_mut(&mut self, field: HostField) -> &mut String {
        match field {
            HostField::Name => &mut self.name,
            HostField::IpAddress => &mut self.ip_address,
            HostField::MacAddress => &mut self.mac_address,
            HostField::Port => &mut self.port,
        }
    }
}

/// A host as stored in the `network_hosts` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Assigned by the store; `None` until the record has been created.
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(flatten)]
    pub fields: HostFields,
}

impl HostRecord {
    pub fn new(key: &str, fields: HostFields) -> Self {
        Self {
            key: Some(key.to_string()),
            fields,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn ip_address(&self) -> &str {
        &self.fields.ip_address
    }

    pub fn mac_address(&self) -> &str {
        &self.fields.mac_address
    }

    pub fn port(&self) -> &str {
        &self.fields.port
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostField {
    Name,
    IpAddress,
    MacAddress,
    Port,
}

impl HostField {
    pub const ALL: [HostField; 4] = [
        HostField::Name,
        HostField::IpAddress,
        HostField::MacAddress,
        HostField::Port,
    ];
}

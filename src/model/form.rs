use super::host::{HostField, HostFields, HostRecord};

/// Per-field validation messages; `None` means the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub port: Option<String>,
}

impl FormErrors {
    pub fn get(&self, field: HostField) -> Option<&str> {
        match field {
            HostField::Name => self.name.as_deref(),
            HostField::IpAddress => self.ip_address.as_deref(),
            HostField::MacAddress => self.mac_address.as_deref(),
            HostField::Port => self.port.as_deref(),
        }
    }

    pub fn set(&mut self, field: HostField, message: Option<String>) {
        let slot = match field {
            HostField::Name => &mut self.name,
            HostField::IpAddress => &mut self.ip_address,
            HostField::MacAddress => &mut self.mac_address,
            HostField::Port => &mut self.port,
        };
        *slot = message;
    }

    /// Number of failing fields.
    pub fn count(&self) -> usize {
        HostField::ALL
            .iter()
            .filter(|f| self.get(**f).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// The create/edit dialog. `key` is `None` when creating a new host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostForm {
    pub key: Option<String>,
    pub fields: HostFields,
    pub errors: FormErrors,
    /// A save request is outstanding
    pub submitting: bool,
    /// Id of the last save started from this form
    pub submission: Option<u64>,
}

impl HostForm {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn for_record(record: &HostRecord) -> Self {
        Self {
            key: record.key.clone(),
            fields: record.fields.clone(),
            ..Self::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.key.as_deref().is_none_or(str::is_empty)
    }

    /// True while this form is still waiting for save `id`.
    pub fn awaits(&self, id: u64) -> bool {
        self.submitting && self.submission == Some(id)
    }
}

use crate::model::{FormErrors, HostField, HostFields};
use regex::Regex;
use std::sync::LazyLock;

// One pattern per separator, so a single address cannot mix them.
static MAC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [":", "-", "\\."]
        .iter()
        .map(|sep| {
            Regex::new(&format!(r"^[0-9A-Fa-f]{{1,2}}({sep}[0-9A-Fa-f]{{1,2}}){{5}}$"))
                .expect("MAC address pattern is valid")
        })
        .collect()
});

static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})$").expect("IPv4 pattern is valid")
});

static PORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("port pattern is valid"));

pub fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
}

pub fn is_valid_mac_address(s: &str) -> bool {
    MAC_PATTERNS.iter().any(|re| re.is_match(s))
}

/// The IP address is optional; when given it must be a dotted quad.
pub fn is_valid_ip_address(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    match IPV4_PATTERN.captures(s) {
        Some(caps) => caps
            .iter()
            .skip(1)
            .flatten()
            .all(|octet| octet.as_str().parse::<u16>().is_ok_and(|v| v <= 255)),
        None => false,
    }
}

/// The port is optional. Any non-negative integer is accepted; the range is
/// left to the wake backend.
pub fn is_valid_port(s: &str) -> bool {
    s.is_empty() || PORT_PATTERN.is_match(s)
}

/// Checks one field and returns the message to show next to it.
pub fn validate_field(field: HostField, value: &str) -> Option<String> {
    let (valid, message) = match field {
        HostField::Name => (is_valid_name(value), "Please enter a name for the host"),
        HostField::IpAddress => (is_valid_ip_address(value), "Please enter a valid IP address"),
        HostField::MacAddress => (
            is_valid_mac_address(value),
            "Please enter a valid MAC address (e.g. 00:11:22:33:44:55)",
        ),
        HostField::Port => (is_valid_port(value), "Please enter a valid port number"),
    };
    if valid { None } else { Some(message.to_string()) }
}

/// Runs every field check. The form may be submitted when `count()` is zero.
pub fn validate_host_form(fields: &HostFields) -> FormErrors {
    let mut errors = FormErrors::default();
    for field in HostField::ALL {
        errors.set(field, validate_field(field, fields.get(field)));
    }
    errors
}

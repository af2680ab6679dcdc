//! Input validation for DNS operations.
//!
//! Every rule reports into a [`Violations`] collector so a request with
//! several bad fields gets all of them back in one response.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use strum::{Display, EnumString, VariantNames};

pub const MAX_DOMAIN_LEN: usize = 253;
pub const MAX_LABEL_LEN: usize = 63;
pub const MIN_TTL: i64 = 1;
pub const MAX_TTL: i64 = 86_400;

/// RFC 1123 hostname label: 1-63 alphanumerics or hyphens, no leading or
/// trailing hyphen.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
        .expect("static label pattern compiles")
});

/// Zone kinds accepted by the zone creation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(ascii_case_insensitive)]
pub enum ZoneType {
    Primary,
    Secondary,
    Stub,
    Forwarder,
    SecondaryForwarder,
    Catalog,
    SecondaryCatalog,
}

fn is_valid_label(label: &str) -> bool {
    label.len() <= MAX_LABEL_LEN && LABEL_RE.is_match(label)
}

/// Check a fully-qualified domain: at least two labels, each a valid hostname label.
pub fn validate_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }

    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| is_valid_label(label))
}

/// Check a record name relative to its zone; `@` denotes the apex.
pub fn validate_record_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_LABEL_LEN {
        return false;
    }
    name == "@" || is_valid_label(name)
}

pub fn validate_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

pub fn validate_ttl(ttl: i64) -> bool {
    (MIN_TTL..=MAX_TTL).contains(&ttl)
}

pub fn parse_zone_type(raw: &str) -> Option<ZoneType> {
    raw.trim().parse().ok()
}

/// Ordered list of violated rules for one request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Record `message` when `ok` is false
    pub fn check(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.0.push(message());
        }
    }

    pub fn domain(&mut self, label: &str, value: &str) {
        self.check(validate_domain(value), || {
            format!("Invalid {} format: '{}'", label, value)
        });
    }

    /// Validate an optional zone; empty strings count as absent
    pub fn optional_zone(&mut self, value: Option<&str>) {
        if let Some(zone) = value {
            self.domain("zone", zone);
        }
    }

    pub fn ip(&mut self, label: &str, value: &str) {
        self.check(validate_ip(value), || {
            format!("Invalid {} format: '{}'", label, value)
        });
    }

    pub fn ttl(&mut self, ttl: i64) {
        self.check(validate_ttl(ttl), || {
            format!("TTL must be integer between {}-{} seconds", MIN_TTL, MAX_TTL)
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use super::api::DnsApiError;
use super::validation::Violations;

pub const DEFAULT_TTL: i64 = 3600;
pub const DEFAULT_MX_PREFERENCE: &str = "10";

/// Record kinds that only exist to support DNSSEC and are hidden from listings
pub const DNSSEC_RECORD_TYPES: [&str; 5] = ["RRSIG", "DNSKEY", "NSEC3", "NSEC3PARAM", "DS"];

/// Uniform outcome of every DNS tool call.
///
/// Built only through the constructors below, so a failure always carries an
/// `error` label and a success always carries a message or payload fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl ToolResult {
    /// Successful operation described by a human-readable message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            details: None,
            payload: Map::new(),
        }
    }

    /// Successful query whose answer lives in top-level payload fields.
    /// Non-object values are stored under `data`; a string `message` field
    /// becomes the envelope message.
    pub fn with_payload(payload: Value) -> Self {
        let mut payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        let message = match payload.remove("message") {
            Some(Value::String(text)) => Some(text),
            Some(other) => {
                payload.insert("message".to_string(), other);
                None
            }
            None => None,
        };

        Self {
            success: true,
            message,
            error: None,
            details: None,
            payload,
        }
    }

    pub fn failure(error: impl Into<String>, details: impl Into<Value>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            details: Some(details.into()),
            payload: Map::new(),
        }
    }

    /// All violated rules reported together
    pub fn validation(violations: Violations) -> Self {
        Self::failure("Validation failed", json!(violations.into_messages()))
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn detail_value(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Top-level payload field, e.g. `records` or `zone_count`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({"success": false, "error": "Unexpected error", "details": e.to_string()})
        })
    }
}

impl From<DnsApiError> for ToolResult {
    fn from(err: DnsApiError) -> Self {
        ToolResult::failure(err.label(), err.details())
    }
}

/// DNS record type as sent to and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    MX,
    TXT,
    NS,
    SOA,
    Other(String),
}

impl RecordType {
    /// Parse a type name, case-insensitively
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::AAAA,
            "CNAME" => RecordType::CNAME,
            "MX" => RecordType::MX,
            "TXT" => RecordType::TXT,
            "NS" => RecordType::NS,
            "SOA" => RecordType::SOA,
            other => RecordType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::NS => "NS",
            RecordType::SOA => "SOA",
            RecordType::Other(name) => name,
        }
    }

    pub fn is_address(&self) -> bool {
        matches!(self, RecordType::A | RecordType::AAAA)
    }

    pub fn is_dnssec(&self) -> bool {
        DNSSEC_RECORD_TYPES.contains(&self.as_str())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record as returned by the `zones/records/get` endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecord {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub r_data: Map<String, Value>,
}

impl ApiRecord {
    pub fn kind(&self) -> RecordType {
        RecordType::parse(&self.record_type)
    }

    pub fn rdata_str(&self, key: &str) -> Option<&str> {
        self.r_data.get(key).and_then(Value::as_str)
    }

    /// Address stored in an A/AAAA record
    pub fn ip_address(&self) -> Option<&str> {
        if self.kind().is_address() {
            self.rdata_str("ipAddress")
        } else {
            None
        }
    }

    /// Read-only projection with only the fields relevant to the record type
    pub fn project(&self) -> DnsRecord {
        let mut data = Map::new();
        let mut copy = |target: &str, source: &str| {
            data.insert(
                target.to_string(),
                self.r_data.get(source).cloned().unwrap_or(Value::Null),
            );
        };

        match self.kind() {
            RecordType::A | RecordType::AAAA => copy("ip", "ipAddress"),
            RecordType::CNAME => copy("cname", "cname"),
            RecordType::MX => {
                copy("exchange", "exchange");
                copy("preference", "preference");
            }
            RecordType::TXT => copy("text", "text"),
            RecordType::NS => copy("nameServer", "nameServer"),
            RecordType::SOA => {
                copy("primaryNameServer", "primaryNameServer");
                copy("responsiblePerson", "responsiblePerson");
                copy("serial", "serial");
            }
            RecordType::Other(_) => {
                data.insert("data".to_string(), Value::Object(self.r_data.clone()));
            }
        }

        DnsRecord {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            ttl: self.ttl,
            disabled: self.disabled,
            data,
        }
    }
}

/// Simplified record handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnsRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: Option<u32>,
    pub disabled: bool,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// Zone entry as returned by the `zones/list` endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZone {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub dnssec_status: Option<String>,
}

impl ApiZone {
    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            name: self.name.clone(),
            zone_type: self.zone_type.clone(),
            disabled: self.disabled,
            internal: self.internal,
            dnssec_status: self
                .dnssec_status
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub zone_type: Option<String>,
    pub disabled: bool,
    pub internal: bool,
    pub dnssec_status: String,
}

fn default_ttl() -> i64 {
    DEFAULT_TTL
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_zone_type() -> String {
    "Primary".to_string()
}

/// Arguments for adding an A record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddRecordRequest {
    pub domain: String,
    pub name: String,
    pub ip: String,
    #[serde(default = "default_ttl")]
    pub ttl: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetRecordsRequest {
    pub domain: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub list_zone: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindByIpRequest {
    pub ip: String,
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRecordRequest {
    pub domain: String,
    pub current_ip: String,
    pub new_ip: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub disable: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameRecordRequest {
    pub old_domain: String,
    pub new_domain: String,
    #[serde(default = "default_record_type")]
    pub record_type: String,
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRecordRequest {
    pub domain: String,
    #[serde(default = "default_record_type")]
    pub record_type: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateZoneRequest {
    pub zone: String,
    #[serde(default = "default_zone_type")]
    pub zone_type: String,
    #[serde(default)]
    pub use_soa_serial_date_scheme: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteZoneRequest {
    pub zone: String,
    #[serde(default)]
    pub confirm: bool,
}

/// Trimmed, non-empty view of an optional string argument
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

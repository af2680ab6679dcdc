//! Client for the DNS server's HTTP management API.

pub mod api;
pub mod client;
pub mod types;
pub mod validation;

pub use api::{DnsApi, DnsApiError};
pub use client::DnsClient;
pub use types::{
    AddRecordRequest, CreateZoneRequest, DeleteRecordRequest, DeleteZoneRequest, DnsRecord,
    FindByIpRequest, GetRecordsRequest, RecordType, RenameRecordRequest, ToolResult,
    UpdateRecordRequest, ZoneSummary,
};
pub use validation::{validate_domain, validate_ip, validate_record_name, validate_ttl, ZoneType};

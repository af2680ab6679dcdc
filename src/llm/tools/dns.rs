use super::{Tool, ToolError, ToolExecutor, DNS_TOOL_NAMES};
use crate::dns::{
    AddRecordRequest, CreateZoneRequest, DeleteRecordRequest, DeleteZoneRequest, DnsClient,
    FindByIpRequest, GetRecordsRequest, RenameRecordRequest, ToolResult, UpdateRecordRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Arguments for tools that take none
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

/// A model-issued DNS tool call decoded into typed arguments
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum DnsToolCall {
    AddDnsRecord(AddRecordRequest),
    GetDnsRecords(GetRecordsRequest),
    FindDomainByIp(FindByIpRequest),
    UpdateDnsRecord(UpdateRecordRequest),
    RenameDnsRecord(RenameRecordRequest),
    DeleteDnsRecord(DeleteRecordRequest),
    CreateDnsZone(CreateZoneRequest),
    ListDnsZones(NoArgs),
    DeleteDnsZone(DeleteZoneRequest),
}

impl DnsToolCall {
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolError> {
        if !DNS_TOOL_NAMES.contains(&name) {
            return Err(ToolError::NotFound(format!("Tool '{}' not found", name)));
        }

        let arguments = if arguments.is_null() { json!({}) } else { arguments };
        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| ToolError::InvalidParameters(format!("{}: {}", name, e)))
    }

    pub async fn execute(self, client: &DnsClient) -> ToolResult {
        match self {
            DnsToolCall::AddDnsRecord(req) => client.add_record(req).await,
            DnsToolCall::GetDnsRecords(req) => client.get_records(req).await,
            DnsToolCall::FindDomainByIp(req) => client.find_by_ip(req).await,
            DnsToolCall::UpdateDnsRecord(req) => client.update_record(req).await,
            DnsToolCall::RenameDnsRecord(req) => client.rename_record(req).await,
            DnsToolCall::DeleteDnsRecord(req) => client.delete_record(req).await,
            DnsToolCall::CreateDnsZone(req) => client.create_zone(req).await,
            DnsToolCall::ListDnsZones(_) => client.list_zones().await,
            DnsToolCall::DeleteDnsZone(req) => client.delete_zone(req).await,
        }
    }
}

/// Executes DNS tool calls against a live [`DnsClient`]
pub struct DnsTools {
    client: DnsClient,
}

impl DnsTools {
    pub fn new(client: DnsClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ToolExecutor for DnsTools {
    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let call = DnsToolCall::parse(name, arguments)?;
        Ok(call.execute(&self.client).await.to_json())
    }
}

fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

/// Catalog entries the model sees, one per DNS operation
pub fn dns_tool_catalog() -> Vec<Tool> {
    vec![
        tool(
            "add_dns_record",
            "Add a DNS A record. Works on existing zones.",
            json!({
                "domain": {"type": "string", "description": "Base domain name (e.g., \"example.com\")"},
                "name": {"type": "string", "description": "Record name: \"@\" for apex, or a subdomain like \"www\""},
                "ip": {"type": "string", "description": "IP address (e.g., \"192.168.1.100\")"},
                "ttl": {"type": "integer", "description": "Time to live in seconds (default 3600)"}
            }),
            &["domain", "name", "ip"],
        ),
        tool(
            "get_dns_records",
            "Get DNS records for a domain.",
            json!({
                "domain": {"type": "string", "description": "Domain to get records for (e.g., \"api.example.com\")"},
                "zone": {"type": "string", "description": "Optional zone name; closest authoritative zone if omitted"},
                "list_zone": {"type": "boolean", "description": "True lists every record in the zone (default false)"}
            }),
            &["domain"],
        ),
        tool(
            "find_domain_by_ip",
            "Find which domain names point to an IP address (reverse lookup).",
            json!({
                "ip": {"type": "string", "description": "IP address to search for"},
                "zone": {"type": "string", "description": "Optional zone to search; all zones if omitted"}
            }),
            &["ip"],
        ),
        tool(
            "update_dns_record",
            "Change the IP ADDRESS of an existing A record. Not for renaming.",
            json!({
                "domain": {"type": "string", "description": "Domain name (e.g., \"api.example.com\")"},
                "current_ip": {"type": "string", "description": "The CURRENT IP address (numbers)"},
                "new_ip": {"type": "string", "description": "The NEW IP address (numbers)"},
                "zone": {"type": "string", "description": "Optional zone name"},
                "ttl": {"type": "integer", "description": "Optional new TTL in seconds"},
                "disable": {"type": "boolean", "description": "True disables the record (default false)"}
            }),
            &["domain", "current_ip", "new_ip"],
        ),
        tool(
            "rename_dns_record",
            "Rename a DNS record (change its domain name). Only A and CNAME records.",
            json!({
                "old_domain": {"type": "string", "description": "Current domain name (e.g., \"sara.data.com\")"},
                "new_domain": {"type": "string", "description": "New domain name (e.g., \"tara.data.com\")"},
                "record_type": {"type": "string", "description": "Record type to rename (default \"A\")"},
                "zone": {"type": "string", "description": "Optional zone name"}
            }),
            &["old_domain", "new_domain"],
        ),
        tool(
            "delete_dns_record",
            "Delete a DNS record. A/AAAA need ip; CNAME, TXT, NS and MX need value.",
            json!({
                "domain": {"type": "string", "description": "Domain of the record to delete"},
                "record_type": {"type": "string", "description": "Record type (default \"A\"): A, AAAA, CNAME, TXT, MX, NS"},
                "ip": {"type": "string", "description": "IP address, for A/AAAA records"},
                "value": {"type": "string", "description": "Record value for other types; MX accepts \"preference,exchange\""},
                "zone": {"type": "string", "description": "Optional zone name"}
            }),
            &["domain"],
        ),
        tool(
            "create_dns_zone",
            "Create a new DNS zone.",
            json!({
                "zone": {"type": "string", "description": "Zone domain name (e.g., \"example.com\")"},
                "zone_type": {"type": "string", "description": "Primary (default), Secondary, Stub, Forwarder, SecondaryForwarder, Catalog or SecondaryCatalog"},
                "use_soa_serial_date_scheme": {"type": "boolean", "description": "Use date scheme for SOA serial (default false)"}
            }),
            &["zone"],
        ),
        tool("list_dns_zones", "List all DNS zones.", json!({}), &[]),
        tool(
            "delete_dns_zone",
            "Delete an entire DNS zone and ALL its records. Cannot be undone.",
            json!({
                "zone": {"type": "string", "description": "Zone to delete"},
                "confirm": {"type": "boolean", "description": "Must be true to confirm deletion"}
            }),
            &["zone", "confirm"],
        ),
    ]
}

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::IpAddr;

use super::api::{DnsApi, DnsApiError, Params};
use super::types::*;
use super::validation::{parse_zone_type, validate_ip, validate_record_name, Violations, ZoneType};
use crate::config::DnsApiConfig;
use strum::VariantNames;

#[derive(Debug, Default, Deserialize)]
struct RecordsPayload {
    #[serde(default)]
    zone: Option<ZoneInfo>,
    #[serde(default)]
    records: Vec<ApiRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct ZoneInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    zone_type: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ZonesPayload {
    #[serde(default)]
    zones: Vec<ApiZone>,
}

fn decode<T: DeserializeOwned + Default>(payload: Value) -> Result<T, DnsApiError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload)
        .map_err(|e| DnsApiError::Unexpected(format!("Malformed response payload: {}", e)))
}

fn same_ip(candidate: &str, wanted: &str) -> bool {
    match (candidate.parse::<IpAddr>(), wanted.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => candidate == wanted,
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.').eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// DNS management operations, each returning a [`ToolResult`] envelope.
///
/// Inputs are validated before any request goes out. Every violated rule is
/// reported in a single `Validation failed` result.
pub struct DnsClient {
    api: DnsApi,
}

impl DnsClient {
    pub fn new(config: DnsApiConfig) -> Result<Self, DnsApiError> {
        Ok(Self {
            api: DnsApi::new(config)?,
        })
    }

    pub fn server_url(&self) -> &str {
        self.api.config().server_url()
    }

    async fn fetch_records(
        &self,
        domain: &str,
        zone: Option<&str>,
        list_zone: bool,
    ) -> Result<RecordsPayload, DnsApiError> {
        let mut params: Params = vec![
            ("domain", domain.to_string()),
            ("listZone", list_zone.to_string()),
        ];
        if let Some(zone) = zone {
            params.push(("zone", zone.to_string()));
        }

        decode(self.api.get("zones/records/get", &params).await?)
    }

    async fn fetch_zones(&self) -> Result<Vec<ApiZone>, DnsApiError> {
        let payload: ZonesPayload = decode(self.api.get("zones/list", &[]).await?)?;
        Ok(payload.zones)
    }

    /// Add an A record `name.domain -> ip` (`@` targets the zone apex)
    pub async fn add_record(&self, req: AddRecordRequest) -> ToolResult {
        let domain = req.domain.trim();
        let name = req.name.trim();
        let ip = req.ip.trim();

        let mut v = Violations::new();
        v.domain("domain", domain);
        v.check(validate_record_name(name), || {
            format!("Invalid record name format: '{}'", name)
        });
        v.ip("IP address", ip);
        v.ttl(req.ttl);
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let domain = domain.to_lowercase();
        let name = name.to_lowercase();
        let full_domain = if name == "@" {
            domain
        } else {
            format!("{}.{}", name, domain)
        };

        let form: Params = vec![
            ("domain", full_domain.clone()),
            ("type", "A".to_string()),
            ("ipAddress", ip.to_string()),
            ("ttl", req.ttl.to_string()),
        ];

        match self.api.post("zones/records/add", &form).await {
            Ok(_) => {
                log::info!("➕ Added A record {} -> {}", full_domain, ip);
                ToolResult::ok(format!("Record added: {} -> {}", full_domain, ip)).details(json!({
                    "domain": full_domain,
                    "ip": ip,
                    "ttl": req.ttl,
                }))
            }
            Err(e) => e.into(),
        }
    }

    /// List records for a domain (or the whole zone), without DNSSEC records
    pub async fn get_records(&self, req: GetRecordsRequest) -> ToolResult {
        let domain = req.domain.trim();
        let zone = present(&req.zone);

        let mut v = Violations::new();
        v.domain("domain", domain);
        v.optional_zone(zone);
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let domain = domain.to_lowercase();
        let zone = zone.map(str::to_lowercase);

        let payload = match self
            .fetch_records(&domain, zone.as_deref(), req.list_zone)
            .await
        {
            Ok(payload) => payload,
            Err(e) => return e.into(),
        };

        let records: Vec<DnsRecord> = payload
            .records
            .iter()
            .filter(|record| !record.kind().is_dnssec())
            .map(ApiRecord::project)
            .collect();
        let zone_info = payload.zone.unwrap_or_default();

        log::debug!("Fetched {} records for {}", records.len(), domain);

        ToolResult::with_payload(json!({
            "zone": {
                "name": zone_info.name,
                "type": zone_info.zone_type,
                "disabled": zone_info.disabled,
            },
            "record_count": records.len(),
            "records": records,
        }))
    }

    /// Reverse lookup: which A/AAAA records point at `ip`
    pub async fn find_by_ip(&self, req: FindByIpRequest) -> ToolResult {
        let ip = req.ip.trim();
        let zone = present(&req.zone);

        let mut v = Violations::new();
        v.ip("IP address", ip);
        v.optional_zone(zone);
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let matches_in = |records: &[ApiRecord], zone_name: Option<&str>| -> Vec<Value> {
            records
                .iter()
                .filter(|record| record.ip_address().is_some_and(|addr| same_ip(addr, ip)))
                .map(|record| {
                    let mut entry = json!({
                        "name": record.name,
                        "type": record.record_type,
                        "ttl": record.ttl,
                        "ip": ip,
                        "disabled": record.disabled,
                    });
                    if let Some(zone_name) = zone_name {
                        entry["zone"] = json!(zone_name);
                    }
                    entry
                })
                .collect()
        };

        if let Some(zone) = zone {
            let zone = zone.to_lowercase();
            let payload = match self.fetch_records(&zone, None, true).await {
                Ok(payload) => payload,
                Err(e) => return e.into(),
            };

            let domains = matches_in(&payload.records, None);
            let found = domains.len();
            let mut result = json!({
                "ip": ip,
                "zone": zone,
                "found_count": found,
                "domains": domains,
            });
            if found == 0 {
                result["message"] = json!(format!(
                    "No domains found pointing to {} in zone {}",
                    ip, zone
                ));
            }
            return ToolResult::with_payload(result);
        }

        let zones = match self.fetch_zones().await {
            Ok(zones) => zones,
            Err(e) => return e.into(),
        };

        let mut domains = Vec::new();
        for zone_name in zones.iter().filter_map(|z| z.name.as_deref()) {
            match self.fetch_records(zone_name, None, true).await {
                Ok(payload) => domains.extend(matches_in(&payload.records, Some(zone_name))),
                Err(e) => log::warn!("Skipping zone {} during IP search: {}", zone_name, e),
            }
        }

        let found = domains.len();
        let mut result = json!({
            "ip": ip,
            "found_count": found,
            "domains": domains,
        });
        if found == 0 {
            result["message"] = json!(format!("No domains found pointing to {} across all zones", ip));
        }
        ToolResult::with_payload(result)
    }

    /// Point an existing A record at a new address
    pub async fn update_record(&self, req: UpdateRecordRequest) -> ToolResult {
        let domain = req.domain.trim();
        let zone = present(&req.zone);
        let current_ip = req.current_ip.trim();
        let new_ip = req.new_ip.trim();

        let mut v = Violations::new();
        v.domain("domain", domain);
        v.optional_zone(zone);
        v.ip("current IP address", current_ip);
        v.ip("new IP address", new_ip);
        if let Some(ttl) = req.ttl {
            v.ttl(ttl);
        }
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let domain = domain.to_lowercase();
        let mut form: Params = vec![
            ("domain", domain.clone()),
            ("type", "A".to_string()),
            ("ipAddress", current_ip.to_string()),
            ("newIpAddress", new_ip.to_string()),
            ("disable", req.disable.to_string()),
        ];
        if let Some(zone) = zone {
            form.push(("zone", zone.to_lowercase()));
        }
        if let Some(ttl) = req.ttl {
            form.push(("ttl", ttl.to_string()));
        }

        match self.api.post("zones/records/update", &form).await {
            Ok(payload) => {
                let updated = payload.get("updatedRecord").cloned().unwrap_or(Value::Null);
                log::info!("✏️ Updated {} from {} to {}", domain, current_ip, new_ip);
                ToolResult::ok(format!(
                    "Record updated: {} changed from {} to {}",
                    domain, current_ip, new_ip
                ))
                .details(json!({
                    "domain": domain,
                    "old_ip": current_ip,
                    "new_ip": new_ip,
                    "ttl": updated.get("ttl").cloned().unwrap_or(Value::Null),
                    "disabled": updated.get("disabled").and_then(Value::as_bool).unwrap_or(false),
                }))
            }
            Err(e) => e.into(),
        }
    }

    /// Move an A or CNAME record to a new name, keeping its value and TTL
    pub async fn rename_record(&self, req: RenameRecordRequest) -> ToolResult {
        let old_domain = req.old_domain.trim();
        let new_domain = req.new_domain.trim();
        let zone = present(&req.zone);

        let mut v = Violations::new();
        v.domain("old domain", old_domain);
        v.domain("new domain", new_domain);
        v.optional_zone(zone);
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let record_type = RecordType::parse(&req.record_type);
        let value_key = match record_type {
            RecordType::A => "ipAddress",
            RecordType::CNAME => "cname",
            _ => {
                return ToolResult::failure(
                    "Unsupported record type",
                    format!(
                        "Renaming {} records is not yet supported. Only A and CNAME records can be renamed.",
                        record_type
                    ),
                )
            }
        };

        let old_domain = old_domain.to_lowercase();
        let new_domain = new_domain.to_lowercase();
        let zone = zone.map(str::to_lowercase);

        let payload = match self.fetch_records(&old_domain, zone.as_deref(), false).await {
            Ok(payload) => payload,
            Err(e) => return e.into(),
        };

        let candidates: Vec<&ApiRecord> = payload
            .records
            .iter()
            .filter(|r| same_name(&r.name, &old_domain) && r.kind() == record_type)
            .collect();

        let target = match candidates.as_slice() {
            [] => {
                return ToolResult::failure(
                    "Record not found",
                    format!("No {} record found for {}", record_type, old_domain),
                )
            }
            [single] => *single,
            many => {
                return ToolResult::failure(
                    "Ambiguous record",
                    format!(
                        "Found {} {} records for {}; rename only works when exactly one exists",
                        many.len(),
                        record_type,
                        old_domain
                    ),
                )
            }
        };

        let Some(value) = target.rdata_str(value_key).filter(|v| !v.is_empty()) else {
            let (error, what) = match record_type {
                RecordType::A => ("Missing IP address", "IP address"),
                _ => ("Missing CNAME", "CNAME"),
            };
            return ToolResult::failure(error, format!("Could not find {} in existing record", what));
        };

        let ttl = target.ttl.map(i64::from).unwrap_or(DEFAULT_TTL);
        let mut form: Params = vec![
            ("domain", old_domain.clone()),
            ("type", record_type.to_string()),
            ("newDomain", new_domain.clone()),
            ("ttl", ttl.to_string()),
            (value_key, value.to_string()),
        ];
        if let Some(zone) = zone {
            form.push(("zone", zone));
        }

        match self.api.post("zones/records/update", &form).await {
            Ok(_) => {
                log::info!("✏️ Renamed {} record {} to {}", record_type, old_domain, new_domain);
                ToolResult::ok(format!("Record renamed: {} → {}", old_domain, new_domain)).details(
                    json!({
                        "old_domain": old_domain,
                        "new_domain": new_domain,
                        "type": record_type.to_string(),
                        "ttl": ttl,
                    }),
                )
            }
            Err(e) => e.into(),
        }
    }

    /// Delete one record identified by type and value
    pub async fn delete_record(&self, req: DeleteRecordRequest) -> ToolResult {
        let domain = req.domain.trim();
        let zone = present(&req.zone);
        let ip = present(&req.ip);
        let value = present(&req.value);
        let record_type = RecordType::parse(&req.record_type);

        let mut v = Violations::new();
        v.domain("domain", domain);
        v.optional_zone(zone);
        match record_type {
            RecordType::A | RecordType::AAAA => match ip {
                None => v.push(format!(
                    "IP address is required for {} record deletion",
                    record_type
                )),
                Some(ip) => v.check(validate_ip(ip), || {
                    format!("Invalid IP address format: '{}'", ip)
                }),
            },
            RecordType::CNAME | RecordType::TXT | RecordType::NS => {
                if value.is_none() {
                    v.push(format!("Value is required for {} record deletion", record_type));
                }
            }
            _ => {}
        }
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let domain = domain.to_lowercase();
        let zone = zone.map(str::to_lowercase);

        let mut form: Params = vec![
            ("domain", domain.clone()),
            ("type", record_type.to_string()),
        ];
        if let Some(zone) = &zone {
            form.push(("zone", zone.clone()));
        }

        let value_str = value.unwrap_or_default().to_string();
        match &record_type {
            RecordType::A | RecordType::AAAA => {
                form.push(("ipAddress", ip.unwrap_or_default().to_string()))
            }
            RecordType::CNAME => form.push(("cname", value_str.clone())),
            RecordType::TXT => form.push(("text", value_str.clone())),
            RecordType::NS => form.push(("nameServer", value_str.clone())),
            RecordType::MX => match value_str.split_once(',') {
                Some((preference, exchange)) => {
                    form.push(("preference", preference.trim().to_string()));
                    form.push(("exchange", exchange.trim().to_string()));
                }
                None => {
                    form.push(("exchange", value_str.clone()));
                    form.push(("preference", DEFAULT_MX_PREFERENCE.to_string()));
                }
            },
            _ => {}
        }

        match self.api.post("zones/records/delete", &form).await {
            Ok(_) => {
                let message = match (&record_type, ip) {
                    (RecordType::A | RecordType::AAAA, Some(ip)) => {
                        format!("Record deleted: {} ({}: {})", domain, record_type, ip)
                    }
                    _ if !value_str.is_empty() => {
                        format!("Record deleted: {} ({}: {})", domain, record_type, value_str)
                    }
                    _ => format!("Record deleted: {} ({})", domain, record_type),
                };
                log::info!("🗑️ {}", message);
                ToolResult::ok(message).details(json!({
                    "domain": domain,
                    "type": record_type.to_string(),
                    "zone": zone.unwrap_or_else(|| "auto-detected".to_string()),
                }))
            }
            Err(e) => e.into(),
        }
    }

    /// Create a zone unless one with the same name already exists
    pub async fn create_zone(&self, req: CreateZoneRequest) -> ToolResult {
        let zone = req.zone.trim();
        let zone_type = parse_zone_type(&req.zone_type);

        let mut v = Violations::new();
        v.domain("zone", zone);
        v.check(zone_type.is_some(), || {
            format!(
                "Invalid zone type: '{}'. Valid types: {}",
                req.zone_type.trim(),
                ZoneType::VARIANTS.join(", ")
            )
        });
        let zone_type = match zone_type {
            Some(zone_type) if v.is_empty() => zone_type,
            _ => return ToolResult::validation(v),
        };

        let zone = zone.to_lowercase();
        let zones = match self.fetch_zones().await {
            Ok(zones) => zones,
            Err(e) => return e.into(),
        };
        if let Some(existing) = zones.iter().find(|z| z.name.as_deref() == Some(zone.as_str())) {
            return ToolResult::failure(
                "Zone already exists",
                format!(
                    "Zone '{}' already exists as {} zone",
                    zone,
                    existing.zone_type.as_deref().unwrap_or("unknown")
                ),
            );
        }

        let mut form: Params = vec![("zone", zone.clone()), ("type", zone_type.to_string())];
        if req.use_soa_serial_date_scheme {
            form.push(("useSoaSerialDateScheme", "true".to_string()));
        }

        match self.api.post("zones/create", &form).await {
            Ok(payload) => {
                let created = payload
                    .get("domain")
                    .and_then(Value::as_str)
                    .unwrap_or(&zone)
                    .to_string();
                log::info!("🌐 Created {} zone {}", zone_type, created);
                ToolResult::ok(format!("Zone created: {}", created)).details(json!({
                    "zone": created,
                    "type": zone_type.to_string(),
                    "soa_serial_date_scheme": req.use_soa_serial_date_scheme,
                }))
            }
            Err(e) => e.into(),
        }
    }

    pub async fn list_zones(&self) -> ToolResult {
        match self.fetch_zones().await {
            Ok(zones) => {
                let zones: Vec<ZoneSummary> = zones.iter().map(ApiZone::summary).collect();
                ToolResult::with_payload(json!({
                    "zone_count": zones.len(),
                    "zones": zones,
                }))
            }
            Err(e) => e.into(),
        }
    }

    /// Delete a zone and all its records. Requires `confirm`.
    pub async fn delete_zone(&self, req: DeleteZoneRequest) -> ToolResult {
        let zone = req.zone.trim();

        let mut v = Violations::new();
        v.domain("zone", zone);
        v.check(req.confirm, || {
            "Deletion not confirmed. Set confirm=true to proceed with zone deletion.".to_string()
        });
        if !v.is_empty() {
            return ToolResult::validation(v);
        }

        let zone = zone.to_lowercase();
        let zones = match self.fetch_zones().await {
            Ok(zones) => zones,
            Err(e) => return e.into(),
        };
        let Some(existing) = zones.iter().find(|z| z.name.as_deref() == Some(zone.as_str())) else {
            return ToolResult::failure("Zone not found", format!("Zone '{}' does not exist", zone));
        };
        let zone_type = existing
            .zone_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        match self.api.post("zones/delete", &[("zone", zone.clone())]).await {
            Ok(_) => {
                log::warn!("🗑️ Deleted zone {} and all of its records", zone);
                ToolResult::ok(format!("Zone deleted: {}", zone)).details(json!({
                    "zone": zone,
                    "type": zone_type,
                    "warning": "All records in this zone have been permanently deleted",
                }))
            }
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DnsClient {
        // Port 9 (discard) on localhost; tests here never reach the network
        let config = DnsApiConfig::new("http://127.0.0.1:9", "token").unwrap();
        DnsClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_add_record_collects_all_violations() {
        let result = client()
            .add_record(AddRecordRequest {
                domain: "bad".to_string(),
                name: "-www".to_string(),
                ip: "999.1.1.1".to_string(),
                ttl: 0,
            })
            .await;

        assert_eq!(result.error(), Some("Validation failed"));
        assert_eq!(
            result.detail_value(),
            Some(&json!([
                "Invalid domain format: 'bad'",
                "Invalid record name format: '-www'",
                "Invalid IP address format: '999.1.1.1'",
                "TTL must be integer between 1-86400 seconds"
            ]))
        );
    }

    #[tokio::test]
    async fn test_delete_zone_without_confirm_fails_locally() {
        let result = client()
            .delete_zone(DeleteZoneRequest {
                zone: "example.com".to_string(),
                confirm: false,
            })
            .await;

        assert_eq!(result.error(), Some("Validation failed"));
        assert_eq!(
            result.detail_value(),
            Some(&json!([
                "Deletion not confirmed. Set confirm=true to proceed with zone deletion."
            ]))
        );
    }

    #[tokio::test]
    async fn test_delete_record_requires_type_specific_value() {
        let c = client();
        let result = c
            .delete_record(DeleteRecordRequest {
                domain: "example.com".to_string(),
                record_type: "aaaa".to_string(),
                ip: None,
                value: None,
                zone: Some(String::new()),
            })
            .await;
        assert_eq!(
            result.detail_value(),
            Some(&json!(["IP address is required for AAAA record deletion"]))
        );

        let result = c
            .delete_record(DeleteRecordRequest {
                domain: "example.com".to_string(),
                record_type: "TXT".to_string(),
                ip: None,
                value: Some("  ".to_string()),
                zone: None,
            })
            .await;
        assert_eq!(
            result.detail_value(),
            Some(&json!(["Value is required for TXT record deletion"]))
        );
    }

    #[tokio::test]
    async fn test_create_zone_rejects_unknown_type() {
        let result = client()
            .create_zone(CreateZoneRequest {
                zone: "example.com".to_string(),
                zone_type: "Master".to_string(),
                use_soa_serial_date_scheme: false,
            })
            .await;

        let details = result.detail_value().unwrap().as_array().unwrap();
        assert_eq!(details.len(), 1);
        assert!(details[0]
            .as_str()
            .unwrap()
            .starts_with("Invalid zone type: 'Master'. Valid types: Primary, Secondary"));
    }

    #[tokio::test]
    async fn test_rename_unsupported_type_fails_before_network() {
        let result = client()
            .rename_record(RenameRecordRequest {
                old_domain: "mail.example.com".to_string(),
                new_domain: "mx.example.com".to_string(),
                record_type: "mx".to_string(),
                zone: None,
            })
            .await;

        assert_eq!(result.error(), Some("Unsupported record type"));
    }

    #[test]
    fn test_ip_and_name_matching() {
        assert!(same_ip("2001:db8::1", "2001:0db8:0:0::1"));
        assert!(!same_ip("10.0.0.1", "10.0.0.2"));
        assert!(same_name("www.example.com.", "WWW.example.com"));
    }
}

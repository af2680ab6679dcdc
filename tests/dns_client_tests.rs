mod common;

use common::MockServer;
use dns_voice_agent::config::DnsApiConfig;
use dns_voice_agent::dns::{
    AddRecordRequest, CreateZoneRequest, DeleteRecordRequest, DeleteZoneRequest, DnsClient,
    FindByIpRequest, GetRecordsRequest, RenameRecordRequest, UpdateRecordRequest,
};
use serde_json::{json, Value};
use std::time::Duration;

const TOKEN: &str = "test-token";

fn client_for(server: &MockServer) -> DnsClient {
    let config = DnsApiConfig::new(&server.uri(), TOKEN).unwrap();
    DnsClient::new(config).unwrap()
}

fn ok(response: Value) -> Value {
    json!({"status": "ok", "response": response})
}

fn a_record(name: &str, ip: &str, ttl: u32) -> Value {
    json!({"name": name, "type": "A", "ttl": ttl, "disabled": false, "rData": {"ipAddress": ip}})
}

fn mount_zones(server: &MockServer, zones: Value) {
    server
        .on("GET", "/api/zones/list")
        .json(200, ok(json!({ "zones": zones })));
}

#[tokio::test]
async fn test_add_then_get_round_trip() {
    let server = MockServer::start().await;
    server.on("POST", "/api/zones/records/add").json(200, ok(json!({})));
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "example.com")
        .json(
            200,
            ok(json!({
                "zone": {"name": "example.com", "type": "Primary", "disabled": false},
                "records": [
                    a_record("www.example.com", "1.2.3.4", 3600),
                    {"name": "www.example.com", "type": "RRSIG", "ttl": 3600, "rData": {"typeCovered": "A"}},
                    {"name": "example.com", "type": "MX", "ttl": 3600,
                     "rData": {"preference": 10, "exchange": "mail.example.com"}}
                ]
            })),
        );

    let client = client_for(&server);
    let added = client
        .add_record(AddRecordRequest {
            domain: " Example.com ".to_string(),
            name: "WWW".to_string(),
            ip: "1.2.3.4".to_string(),
            ttl: 3600,
        })
        .await;
    assert!(added.is_success(), "{:?}", added);
    assert_eq!(added.message(), Some("Record added: www.example.com -> 1.2.3.4"));

    let posted = server.requests_to("POST", "/api/zones/records/add");
    assert_eq!(posted.len(), 1);
    assert_eq!(
        posted[0].form(),
        vec![
            ("token".to_string(), TOKEN.to_string()),
            ("domain".to_string(), "www.example.com".to_string()),
            ("type".to_string(), "A".to_string()),
            ("ipAddress".to_string(), "1.2.3.4".to_string()),
            ("ttl".to_string(), "3600".to_string()),
        ]
    );

    let fetched = client
        .get_records(GetRecordsRequest {
            domain: "example.com".to_string(),
            zone: None,
            list_zone: true,
        })
        .await;
    assert!(fetched.is_success());
    assert_eq!(fetched.get("record_count"), Some(&json!(2)));

    let records = fetched.get("records").unwrap().as_array().unwrap();
    assert_eq!(
        records[0],
        json!({"name": "www.example.com", "type": "A", "ttl": 3600, "disabled": false, "ip": "1.2.3.4"})
    );
    assert_eq!(records[1]["exchange"], "mail.example.com");
    assert_eq!(fetched.get("zone").unwrap()["type"], "Primary");

    let get = &server.requests_to("GET", "/api/zones/records/get")[0];
    assert_eq!(get.query_value("token"), Some(TOKEN));
    assert_eq!(get.query_value("listZone"), Some("true"));
    assert_eq!(get.query_value("zone"), None);
}

#[tokio::test]
async fn test_http_and_server_errors_are_labelled() {
    let server = MockServer::start().await;
    server.on("GET", "/api/zones/list").text(503, "maintenance");
    server.on("POST", "/api/zones/records/delete").json(
        200,
        json!({"status": "error", "errorMessage": "No such zone was found: nowhere.org"}),
    );

    let client = client_for(&server);

    let listed = client.list_zones().await;
    assert_eq!(listed.error(), Some("HTTP error"));
    assert_eq!(listed.detail_value(), Some(&json!("Server returned 503")));

    let deleted = client
        .delete_record(DeleteRecordRequest {
            domain: "www.nowhere.org".to_string(),
            record_type: "A".to_string(),
            ip: Some("10.0.0.1".to_string()),
            value: None,
            zone: None,
        })
        .await;
    assert_eq!(deleted.error(), Some("DNS server error"));
    assert_eq!(
        deleted.detail_value(),
        Some(&json!("No such zone was found: nowhere.org"))
    );
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let server = MockServer::start().await;
    server
        .on("GET", "/api/zones/list")
        .delay(Duration::from_secs(3))
        .json(200, ok(json!({"zones": []})));

    let mut config = DnsApiConfig::new(&server.uri(), TOKEN).unwrap();
    config.timeout = Duration::from_secs(1);
    let client = DnsClient::new(config).unwrap();

    let result = client.list_zones().await;
    assert_eq!(result.error(), Some("Request timeout"));
    assert_eq!(
        result.detail_value(),
        Some(&json!("DNS server did not respond within 1 seconds"))
    );
}

#[tokio::test]
async fn test_connection_failure_is_reported() {
    // Nothing listens on port 1
    let config = DnsApiConfig::new("http://127.0.0.1:1", TOKEN).unwrap();
    let client = DnsClient::new(config).unwrap();

    let result = client.list_zones().await;
    assert_eq!(result.error(), Some("Connection failed"));
    assert_eq!(
        result.detail_value(),
        Some(&json!("Cannot connect to DNS server at http://127.0.0.1:1"))
    );
}

#[tokio::test]
async fn test_unconfirmed_zone_delete_makes_no_request() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let mut details = Vec::new();
    for _ in 0..2 {
        let result = client
            .delete_zone(DeleteZoneRequest {
                zone: "example.com".to_string(),
                confirm: false,
            })
            .await;
        assert_eq!(result.error(), Some("Validation failed"));
        details.push(result.detail_value().cloned());
    }

    assert_eq!(details[0], details[1]);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_zone_delete_checks_existence() {
    let server = MockServer::start().await;
    mount_zones(&server, json!([{"name": "example.com", "type": "Primary"}]));
    server.on("POST", "/api/zones/delete").json(200, ok(json!({})));

    let client = client_for(&server);

    let missing = client
        .delete_zone(DeleteZoneRequest {
            zone: "other.com".to_string(),
            confirm: true,
        })
        .await;
    assert_eq!(missing.error(), Some("Zone not found"));
    assert!(server.requests_to("POST", "/api/zones/delete").is_empty());

    let deleted = client
        .delete_zone(DeleteZoneRequest {
            zone: "EXAMPLE.com".to_string(),
            confirm: true,
        })
        .await;
    assert!(deleted.is_success());
    assert_eq!(deleted.detail_value().unwrap()["type"], "Primary");

    let posted = server.requests_to("POST", "/api/zones/delete");
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].form_value("zone").as_deref(), Some("example.com"));
}

#[tokio::test]
async fn test_create_zone_rejects_existing() {
    let server = MockServer::start().await;
    mount_zones(&server, json!([{"name": "example.com", "type": "Primary"}]));
    server
        .on("POST", "/api/zones/create")
        .json(200, ok(json!({"domain": "new.org"})));

    let client = client_for(&server);

    let existing = client
        .create_zone(CreateZoneRequest {
            zone: "example.com".to_string(),
            zone_type: "Primary".to_string(),
            use_soa_serial_date_scheme: false,
        })
        .await;
    assert_eq!(existing.error(), Some("Zone already exists"));
    assert!(server.requests_to("POST", "/api/zones/create").is_empty());

    let created = client
        .create_zone(CreateZoneRequest {
            zone: "new.org".to_string(),
            zone_type: "forwarder".to_string(),
            use_soa_serial_date_scheme: true,
        })
        .await;
    assert!(created.is_success(), "{:?}", created);
    assert_eq!(created.message(), Some("Zone created: new.org"));

    let posted = &server.requests_to("POST", "/api/zones/create")[0];
    assert_eq!(posted.form_value("type").as_deref(), Some("Forwarder"));
    assert_eq!(
        posted.form_value("useSoaSerialDateScheme").as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn test_list_zones_defaults_dnssec_status() {
    let server = MockServer::start().await;
    mount_zones(
        &server,
        json!([
            {"name": "example.com", "type": "Primary", "dnssecStatus": "SignedWithNSEC"},
            {"name": "lab.internal", "type": "Forwarder", "internal": true}
        ]),
    );

    let result = client_for(&server).list_zones().await;
    assert_eq!(result.get("zone_count"), Some(&json!(2)));
    let zones = result.get("zones").unwrap();
    assert_eq!(zones[0]["dnssec_status"], "SignedWithNSEC");
    assert_eq!(zones[1]["dnssec_status"], "Unknown");
    assert_eq!(zones[1]["internal"], true);
}

#[tokio::test]
async fn test_find_by_ip_skips_failing_zones() {
    let server = MockServer::start().await;
    mount_zones(
        &server,
        json!([{"name": "a.com"}, {"name": "broken.com"}, {"name": "c.com"}]),
    );
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "a.com")
        .json(
            200,
            ok(json!({"records": [
                a_record("api.a.com", "10.0.0.5", 300),
                a_record("web.a.com", "10.0.0.6", 300)
            ]})),
        );
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "broken.com")
        .text(500, "boom");
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "c.com")
        .json(
            200,
            ok(json!({"records": [
                {"name": "c.com", "type": "CNAME", "ttl": 300, "rData": {"cname": "10.0.0.5"}}
            ]})),
        );

    let client = client_for(&server);
    let result = client
        .find_by_ip(FindByIpRequest {
            ip: "10.0.0.5".to_string(),
            zone: None,
        })
        .await;

    assert!(result.is_success());
    assert_eq!(result.get("found_count"), Some(&json!(1)));
    let domains = result.get("domains").unwrap();
    assert_eq!(domains[0]["name"], "api.a.com");
    assert_eq!(domains[0]["zone"], "a.com");
    assert_eq!(server.requests_to("GET", "/api/zones/records/get").len(), 3);

    let none = client
        .find_by_ip(FindByIpRequest {
            ip: "192.168.9.9".to_string(),
            zone: None,
        })
        .await;
    assert_eq!(none.get("found_count"), Some(&json!(0)));
    assert_eq!(
        none.message(),
        Some("No domains found pointing to 192.168.9.9 across all zones")
    );
}

#[tokio::test]
async fn test_find_by_ip_within_one_zone() {
    let server = MockServer::start().await;
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "example.com")
        .json(
            200,
            ok(json!({"records": [
                a_record("www.example.com", "10.0.0.5", 300),
                a_record("api.example.com", "10.0.0.6", 300),
                {"name": "v6.example.com", "type": "AAAA", "ttl": 600, "disabled": true,
                 "rData": {"ipAddress": "2001:db8::5"}},
                {"name": "alias.example.com", "type": "CNAME", "ttl": 300,
                 "rData": {"cname": "10.0.0.5"}}
            ]})),
        );

    let client = client_for(&server);
    let found = client
        .find_by_ip(FindByIpRequest {
            ip: "10.0.0.5".to_string(),
            zone: Some(" Example.COM ".to_string()),
        })
        .await;

    assert!(found.is_success(), "{:?}", found);
    assert_eq!(found.get("zone"), Some(&json!("example.com")));
    assert_eq!(found.get("found_count"), Some(&json!(1)));
    assert_eq!(
        found.get("domains"),
        Some(&json!([{"name": "www.example.com", "type": "A", "ttl": 300, "ip": "10.0.0.5", "disabled": false}]))
    );
    assert_eq!(found.message(), None);

    let v6 = client
        .find_by_ip(FindByIpRequest {
            ip: "2001:0db8:0::5".to_string(),
            zone: Some("example.com".to_string()),
        })
        .await;
    assert_eq!(v6.get("found_count"), Some(&json!(1)));
    assert_eq!(v6.get("domains").unwrap()[0]["name"], "v6.example.com");
    assert_eq!(v6.get("domains").unwrap()[0]["disabled"], true);

    let none = client
        .find_by_ip(FindByIpRequest {
            ip: "192.0.2.1".to_string(),
            zone: Some("example.com".to_string()),
        })
        .await;
    assert!(none.is_success());
    assert_eq!(none.get("found_count"), Some(&json!(0)));
    assert_eq!(
        none.message(),
        Some("No domains found pointing to 192.0.2.1 in zone example.com")
    );

    // Scoped searches never list zones
    assert!(server.requests_to("GET", "/api/zones/list").is_empty());
    let gets = server.requests_to("GET", "/api/zones/records/get");
    assert_eq!(gets.len(), 3);
    for get in &gets {
        assert_eq!(get.query_value("domain"), Some("example.com"));
        assert_eq!(get.query_value("listZone"), Some("true"));
        assert_eq!(get.query_value("zone"), None);
        assert_eq!(get.query_value("token"), Some(TOKEN));
    }
}

#[tokio::test]
async fn test_update_record_sends_both_addresses() {
    let server = MockServer::start().await;
    server
        .on("POST", "/api/zones/records/update")
        .json(200, ok(json!({"updatedRecord": {"ttl": 600, "disabled": false}})));

    let result = client_for(&server)
        .update_record(UpdateRecordRequest {
            domain: "api.example.com".to_string(),
            current_ip: "10.0.0.1".to_string(),
            new_ip: "10.0.0.2".to_string(),
            zone: None,
            ttl: None,
            disable: false,
        })
        .await;

    assert!(result.is_success());
    assert_eq!(result.detail_value().unwrap()["ttl"], 600);
    assert_eq!(result.detail_value().unwrap()["new_ip"], "10.0.0.2");

    let posted = &server.requests_to("POST", "/api/zones/records/update")[0];
    assert_eq!(posted.form_value("ipAddress").as_deref(), Some("10.0.0.1"));
    assert_eq!(posted.form_value("newIpAddress").as_deref(), Some("10.0.0.2"));
    assert_eq!(posted.form_value("disable").as_deref(), Some("false"));
    assert_eq!(posted.form_value("ttl"), None);
}

#[tokio::test]
async fn test_rename_mx_issues_no_request() {
    let server = MockServer::start().await;

    let result = client_for(&server)
        .rename_record(RenameRecordRequest {
            old_domain: "mail.example.com".to_string(),
            new_domain: "mx.example.com".to_string(),
            record_type: "MX".to_string(),
            zone: None,
        })
        .await;

    assert_eq!(result.error(), Some("Unsupported record type"));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_rename_carries_value_and_ttl() {
    let server = MockServer::start().await;
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "sara.data.com")
        .json(
            200,
            ok(json!({"records": [a_record("sara.data.com", "10.1.1.1", 300)]})),
        );
    server
        .on("POST", "/api/zones/records/update")
        .json(200, ok(json!({})));

    let result = client_for(&server)
        .rename_record(RenameRecordRequest {
            old_domain: "sara.data.com".to_string(),
            new_domain: "tara.data.com".to_string(),
            record_type: "A".to_string(),
            zone: None,
        })
        .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.detail_value().unwrap()["ttl"], 300);

    let posted = &server.requests_to("POST", "/api/zones/records/update")[0];
    assert_eq!(posted.form_value("domain").as_deref(), Some("sara.data.com"));
    assert_eq!(posted.form_value("newDomain").as_deref(), Some("tara.data.com"));
    assert_eq!(posted.form_value("ipAddress").as_deref(), Some("10.1.1.1"));
    assert_eq!(posted.form_value("ttl").as_deref(), Some("300"));
}

#[tokio::test]
async fn test_rename_refuses_ambiguous_or_missing_records() {
    let server = MockServer::start().await;
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "lb.data.com")
        .json(
            200,
            ok(json!({"records": [
                a_record("lb.data.com", "10.1.1.1", 300),
                a_record("lb.data.com", "10.1.1.2", 300)
            ]})),
        );
    server
        .on("GET", "/api/zones/records/get")
        .query("domain", "ghost.data.com")
        .json(200, ok(json!({"records": []})));

    let client = client_for(&server);
    let ambiguous = client
        .rename_record(RenameRecordRequest {
            old_domain: "lb.data.com".to_string(),
            new_domain: "edge.data.com".to_string(),
            record_type: "A".to_string(),
            zone: None,
        })
        .await;
    assert_eq!(ambiguous.error(), Some("Ambiguous record"));

    let missing = client
        .rename_record(RenameRecordRequest {
            old_domain: "ghost.data.com".to_string(),
            new_domain: "spirit.data.com".to_string(),
            record_type: "CNAME".to_string(),
            zone: None,
        })
        .await;
    assert_eq!(missing.error(), Some("Record not found"));

    assert!(server
        .requests()
        .iter()
        .all(|request| request.method == "GET"));
}

#[tokio::test]
async fn test_delete_mx_splits_preference() {
    let server = MockServer::start().await;
    server
        .on("POST", "/api/zones/records/delete")
        .json(200, ok(json!({})));

    let result = client_for(&server)
        .delete_record(DeleteRecordRequest {
            domain: "example.com".to_string(),
            record_type: "mx".to_string(),
            ip: None,
            value: Some("20, mail.example.com".to_string()),
            zone: None,
        })
        .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.detail_value().unwrap()["zone"], "auto-detected");

    let posted = &server.requests_to("POST", "/api/zones/records/delete")[0];
    assert_eq!(posted.form_value("type").as_deref(), Some("MX"));
    assert_eq!(posted.form_value("preference").as_deref(), Some("20"));
    assert_eq!(
        posted.form_value("exchange").as_deref(),
        Some("mail.example.com")
    );
}

#[cfg(feature = "test-api")]
#[tokio::test]
async fn test_live_server_lists_zones() {
    let config = dns_voice_agent::config::AppConfig::load().unwrap();
    let client = DnsClient::new(config.dns).unwrap();

    let result = client.list_zones().await;
    assert!(result.is_success(), "{:?}", result);
    assert!(result.get("zone_count").is_some());
}

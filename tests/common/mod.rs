//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use asset_relay::{
    bus::ChangeBus,
    codec::{Codec, TypeRegistry},
    service::GraphService,
    store::MemoryStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
pub fn codec() -> Codec {
    Codec::new(Arc::new(TypeRegistry::standard()))
}

/// A service over a fresh in-memory store.
#[allow(dead_code)]
pub fn service(queue: usize) -> Arc<GraphService> {
    Arc::new(GraphService::new(
        Arc::new(TypeRegistry::standard()),
        Arc::new(MemoryStore::new()),
        ChangeBus::new(queue),
    ))
}

/// One valid payload per asset kind, keyed by discriminator.
#[allow(dead_code)]
pub fn asset_samples() -> Vec<(&'static str, Value)> {
    vec![
        ("Account", json!({"unique_id": "acct-1", "account_type": "checking", "username": "jdoe"})),
        (
            "AutnumRecord",
            json!({"number": 64496, "handle": "AS64496", "name": "EXAMPLE-AS", "status": ["active"]}),
        ),
        ("AutonomousSystem", json!({"number": 64496})),
        ("ContactRecord", json!({"discovered_at": "https://example.com/contact"})),
        (
            "DomainRecord",
            json!({"domain": "example.com", "name": "example", "status": ["clientTransferProhibited"]}),
        ),
        (
            "File",
            json!({"url": "https://example.com/a.pdf", "name": "a.pdf", "type": "application/pdf"}),
        ),
        ("FQDN", json!({"name": "www.example.com"})),
        ("FundsTransfer", json!({"unique_id": "tx-1", "amount": 1250.5, "currency": "USD"})),
        ("Identifier", json!({"unique_id": "lei:123", "id": "123", "id_type": "lei"})),
        ("IPAddress", json!({"address": "2001:db8::1", "type": "IPv6"})),
        (
            "IPNetRecord",
            json!({
                "cidr": "192.0.2.0/24",
                "handle": "NET-192-0-2-0-1",
                "start_address": "192.0.2.0",
                "end_address": "192.0.2.255",
                "type": "IPv4",
                "name": "EXAMPLE-NET"
            }),
        ),
        (
            "Location",
            json!({"address": "1 Main St, Springfield", "city": "Springfield", "gln": 1234567890123u64}),
        ),
        ("Netblock", json!({"cidr": "198.51.100.0/24", "type": "IPv4"})),
        (
            "Organization",
            json!({"unique_id": "org-1", "name": "Example Corp", "target_markets": ["security"], "headcount": 250}),
        ),
        ("Person", json!({"unique_id": "person-1", "full_name": "Jane Doe", "first_name": "Jane"})),
        (
            "Phone",
            json!({"type": "mobile", "raw": "+1 555 0100", "e164": "+15550100", "country_code": 1}),
        ),
        ("Product", json!({"unique_id": "prod-1", "product_name": "Widget"})),
        ("ProductRelease", json!({"name": "Widget 2.0", "release_date": "2024-01-01"})),
        (
            "Service",
            json!({"unique_id": "svc-1", "service_type": "HTTP", "attributes": {"Server": ["nginx"]}}),
        ),
        (
            "TLSCertificate",
            json!({
                "serial_number": "0a1b",
                "subject_common_name": "example.com",
                "issuer_common_name": "Example CA",
                "not_before": "2024-01-01T00:00:00Z",
                "not_after": "2025-01-01T00:00:00Z",
                "is_ca": false
            }),
        ),
        (
            "URL",
            json!({"url": "https://example.com:8443/x", "host": "example.com", "port": 8443, "path": "/x"}),
        ),
    ]
}

/// One valid payload per relation kind, keyed by discriminator.
#[allow(dead_code)]
pub fn relation_samples() -> Vec<(&'static str, Value)> {
    vec![
        (
            "BasicDNSRelation",
            json!({"name": "dns_record", "header": {"rr_type": 1, "class": 1, "ttl": 300}}),
        ),
        ("PortRelation", json!({"name": "port", "port_number": 443, "protocol": "tcp"})),
        (
            "PrefDNSRelation",
            json!({"name": "dns_record", "header": {"rr_type": 15, "class": 1, "ttl": 300}, "preference": 10}),
        ),
        ("SimpleRelation", json!({"name": "node"})),
        (
            "SRVDNSRelation",
            json!({
                "name": "dns_record",
                "header": {"rr_type": 33, "class": 1, "ttl": 300},
                "priority": 10,
                "weight": 5,
                "port": 5060
            }),
        ),
    ]
}

/// One valid payload per property kind, keyed by discriminator.
#[allow(dead_code)]
pub fn property_samples() -> Vec<(&'static str, Value)> {
    vec![
        (
            "DNSRecordProperty",
            json!({
                "property_name": "dns_record",
                "header": {"rr_type": 16, "class": 1, "ttl": 300},
                "data": "v=spf1 -all"
            }),
        ),
        ("SimpleProperty", json!({"property_name": "owner", "property_value": "ops"})),
        ("SourceProperty", json!({"name": "crtsh", "confidence": 90})),
        (
            "VulnProperty",
            json!({
                "id": "CVE-2024-0001",
                "description": "Example",
                "enum": "CWE-79",
                "ref": "https://example.com/cve"
            }),
        ),
    ]
}

#[allow(dead_code)]
pub fn fqdn_body(name: &str) -> Vec<u8> {
    json!({"type": "FQDN", "asset": {"name": name}})
        .to_string()
        .into_bytes()
}

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, net::IpAddr};

use super::{Domain, Payload};

discriminators! {
    /// Discriminator for [`Asset`] payloads (the `type` field of an entity).
    AssetKind {
        Account => "Account",
        AutnumRecord => "AutnumRecord",
        AutonomousSystem => "AutonomousSystem",
        ContactRecord => "ContactRecord",
        DomainRecord => "DomainRecord",
        File => "File",
        Fqdn => "FQDN",
        FundsTransfer => "FundsTransfer",
        Identifier => "Identifier",
        IpAddress => "IPAddress",
        IpNetRecord => "IPNetRecord",
        Location => "Location",
        Netblock => "Netblock",
        Organization => "Organization",
        Person => "Person",
        Phone => "Phone",
        Product => "Product",
        ProductRelease => "ProductRelease",
        Service => "Service",
        TlsCertificate => "TLSCertificate",
        Url => "URL",
    }
}

/// IP address family, as carried in the `type` field of address-bearing assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    IPv4,
    IPv6,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Account {
    pub unique_id: String,
    pub account_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutnumRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub number: u32,
    pub handle: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutonomousSystem {
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactRecord {
    pub discovered_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punycode: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct File {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fqdn {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundsTransfer {
    pub unique_id: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    pub unique_id: String,
    pub id: String,
    pub id_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpAddress {
    pub address: IpAddr,
    #[serde(rename = "type")]
    pub ip_type: IpVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpNetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub cidr: String,
    pub handle: String,
    pub start_address: IpAddr,
    pub end_address: IpAddr,
    #[serde(rename = "type")]
    pub ip_type: IpVersion,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_box: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gln: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Netblock {
    pub cidr: String,
    #[serde(rename = "type")]
    pub ip_type: IpVersion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Organization {
    pub unique_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founding_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_markets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_profit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headcount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Person {
    pub unique_id: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Phone {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<String>,
    pub raw: String,
    pub e164: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_abbrev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub unique_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductRelease {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    pub unique_id: String,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_length: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsCertificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub serial_number: String,
    pub subject_common_name: String,
    pub issuer_common_name: String,
    pub not_before: String,
    pub not_after: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_usage: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_key_usage: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_algorithm: Option<String>,
    #[serde(default)]
    pub is_ca: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crl_distribution_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Url {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

/// The payload of an entity.
///
/// Serializes as the bare inner struct; the discriminator travels in the envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Asset {
    Account(Account),
    AutnumRecord(AutnumRecord),
    AutonomousSystem(AutonomousSystem),
    ContactRecord(ContactRecord),
    DomainRecord(DomainRecord),
    File(File),
    Fqdn(Fqdn),
    FundsTransfer(FundsTransfer),
    Identifier(Identifier),
    IpAddress(IpAddress),
    IpNetRecord(IpNetRecord),
    Location(Location),
    Netblock(Netblock),
    Organization(Organization),
    Person(Person),
    Phone(Phone),
    Product(Product),
    ProductRelease(ProductRelease),
    Service(Service),
    TlsCertificate(TlsCertificate),
    Url(Url),
}

impl Asset {
    /// The natural identifying value of the asset, for logs and diagnostics.
    pub fn key(&self) -> String {
        match self {
            Asset::Account(a) => a.unique_id.clone(),
            Asset::AutnumRecord(a) => a.handle.clone(),
            Asset::AutonomousSystem(a) => a.number.to_string(),
            Asset::ContactRecord(a) => a.discovered_at.clone(),
            Asset::DomainRecord(a) => a.domain.clone(),
            Asset::File(a) => a.url.clone(),
            Asset::Fqdn(a) => a.name.clone(),
            Asset::FundsTransfer(a) => a.unique_id.clone(),
            Asset::Identifier(a) => a.unique_id.clone(),
            Asset::IpAddress(a) => a.address.to_string(),
            Asset::IpNetRecord(a) => a.cidr.clone(),
            Asset::Location(a) => a.address.clone(),
            Asset::Netblock(a) => a.cidr.clone(),
            Asset::Organization(a) => a.unique_id.clone(),
            Asset::Person(a) => a.unique_id.clone(),
            Asset::Phone(a) => a.e164.clone(),
            Asset::Product(a) => a.unique_id.clone(),
            Asset::ProductRelease(a) => a.name.clone(),
            Asset::Service(a) => a.unique_id.clone(),
            Asset::TlsCertificate(a) => a.serial_number.clone(),
            Asset::Url(a) => a.url.clone(),
        }
    }
}

impl Payload for Asset {
    type Kind = AssetKind;
    const DOMAIN: Domain = Domain::Asset;

    fn kind(&self) -> AssetKind {
        match self {
            Asset::Account(_) => AssetKind::Account,
            Asset::AutnumRecord(_) => AssetKind::AutnumRecord,
            Asset::AutonomousSystem(_) => AssetKind::AutonomousSystem,
            Asset::ContactRecord(_) => AssetKind::ContactRecord,
            Asset::DomainRecord(_) => AssetKind::DomainRecord,
            Asset::File(_) => AssetKind::File,
            Asset::Fqdn(_) => AssetKind::Fqdn,
            Asset::FundsTransfer(_) => AssetKind::FundsTransfer,
            Asset::Identifier(_) => AssetKind::Identifier,
            Asset::IpAddress(_) => AssetKind::IpAddress,
            Asset::IpNetRecord(_) => AssetKind::IpNetRecord,
            Asset::Location(_) => AssetKind::Location,
            Asset::Netblock(_) => AssetKind::Netblock,
            Asset::Organization(_) => AssetKind::Organization,
            Asset::Person(_) => AssetKind::Person,
            Asset::Phone(_) => AssetKind::Phone,
            Asset::Product(_) => AssetKind::Product,
            Asset::ProductRelease(_) => AssetKind::ProductRelease,
            Asset::Service(_) => AssetKind::Service,
            Asset::TlsCertificate(_) => AssetKind::TlsCertificate,
            Asset::Url(_) => AssetKind::Url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_optional_fields_are_skipped() {
        let asset = Asset::Url(Url {
            url: "https://example.com".to_string(),
            scheme: Some("https".to_string()),
            username: None,
            password: None,
            host: "example.com".to_string(),
            port: None,
            path: None,
            options: None,
            fragment: None,
        });
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "https://example.com", "scheme": "https", "host": "example.com"})
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let res = serde_json::from_str::<Fqdn>(r#"{"name": "example.com", "tld": "com"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_ip_address_is_typed() {
        let ok = serde_json::from_str::<IpAddress>(r#"{"address": "192.0.2.1", "type": "IPv4"}"#);
        assert!(ok.is_ok());
        let bad = serde_json::from_str::<IpAddress>(r#"{"address": "not-an-ip", "type": "IPv4"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_key_uses_natural_identifier() {
        let asset = Asset::Fqdn(Fqdn {
            name: "example.com".to_string(),
        });
        assert_eq!(asset.key(), "example.com");
        assert_eq!(asset.kind(), AssetKind::Fqdn);
    }
}

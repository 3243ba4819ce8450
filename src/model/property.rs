use serde::{Deserialize, Serialize};

use super::{relation::RrHeader, Domain, Payload};

discriminators! {
    /// Discriminator for [`Property`] payloads (the `type` field of entity and edge tags).
    PropertyKind {
        DnsRecordProperty => "DNSRecordProperty",
        SimpleProperty => "SimpleProperty",
        SourceProperty => "SourceProperty",
        VulnProperty => "VulnProperty",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsRecordProperty {
    pub property_name: String,
    pub header: RrHeader,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleProperty {
    pub property_name: String,
    pub property_value: String,
}

/// Where an observation came from, with a 0-100 confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceProperty {
    pub name: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VulnProperty {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// The payload of an entity tag or edge tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Property {
    DnsRecordProperty(DnsRecordProperty),
    SimpleProperty(SimpleProperty),
    SourceProperty(SourceProperty),
    VulnProperty(VulnProperty),
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::DnsRecordProperty(p) => &p.property_name,
            Property::SimpleProperty(p) => &p.property_name,
            Property::SourceProperty(p) => &p.name,
            Property::VulnProperty(p) => &p.id,
        }
    }
}

impl Payload for Property {
    type Kind = PropertyKind;
    const DOMAIN: Domain = Domain::Property;

    fn kind(&self) -> PropertyKind {
        match self {
            Property::DnsRecordProperty(_) => PropertyKind::DnsRecordProperty,
            Property::SimpleProperty(_) => PropertyKind::SimpleProperty,
            Property::SourceProperty(_) => PropertyKind::SourceProperty,
            Property::VulnProperty(_) => PropertyKind::VulnProperty,
        }
    }
}

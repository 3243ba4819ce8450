use serde::{Deserialize, Serialize};

use super::{Domain, Payload};

discriminators! {
    /// Discriminator for [`Relation`] payloads (the `type` field of an edge).
    RelationKind {
        BasicDnsRelation => "BasicDNSRelation",
        PortRelation => "PortRelation",
        PrefDnsRelation => "PrefDNSRelation",
        SimpleRelation => "SimpleRelation",
        SrvDnsRelation => "SRVDNSRelation",
    }
}

/// DNS resource record header shared by the DNS relations and the DNS record property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RrHeader {
    pub rr_type: u16,
    pub class: u16,
    pub ttl: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicDnsRelation {
    pub name: String,
    pub header: RrHeader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortRelation {
    pub name: String,
    pub port_number: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefDnsRelation {
    pub name: String,
    pub header: RrHeader,
    pub preference: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleRelation {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SrvDnsRelation {
    pub name: String,
    pub header: RrHeader,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
}

/// The payload of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Relation {
    BasicDnsRelation(BasicDnsRelation),
    PortRelation(PortRelation),
    PrefDnsRelation(PrefDnsRelation),
    SimpleRelation(SimpleRelation),
    SrvDnsRelation(SrvDnsRelation),
}

impl Relation {
    /// Relation label, e.g. `dns_record` or `port`.
    pub fn name(&self) -> &str {
        match self {
            Relation::BasicDnsRelation(r) => &r.name,
            Relation::PortRelation(r) => &r.name,
            Relation::PrefDnsRelation(r) => &r.name,
            Relation::SimpleRelation(r) => &r.name,
            Relation::SrvDnsRelation(r) => &r.name,
        }
    }
}

impl Payload for Relation {
    type Kind = RelationKind;
    const DOMAIN: Domain = Domain::Relation;

    fn kind(&self) -> RelationKind {
        match self {
            Relation::BasicDnsRelation(_) => RelationKind::BasicDnsRelation,
            Relation::PortRelation(_) => RelationKind::PortRelation,
            Relation::PrefDnsRelation(_) => RelationKind::PrefDnsRelation,
            Relation::SimpleRelation(_) => RelationKind::SimpleRelation,
            Relation::SrvDnsRelation(_) => RelationKind::SrvDnsRelation,
        }
    }
}

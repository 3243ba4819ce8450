//! The four envelope kinds and their wire forms.
//!
//! An envelope is the unit of exchange: identity, timestamps, a discriminated payload and the IDs
//! of the records it points at. Records never store their discriminator. The `type` field is
//! written from [`Payload::kind`] on output and only read on input to pick (and then check) the
//! payload factory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt::{self, Display, Formatter};

use crate::{
    error::RelayError,
    model::{Asset, AssetKind, Payload, Property, PropertyKind, Relation, RelationKind},
};

/// Which of the four record types an envelope, reference or event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Entity,
    Edge,
    EntityTag,
    EdgeTag,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Entity,
        RecordKind::Edge,
        RecordKind::EntityTag,
        RecordKind::EdgeTag,
    ];

    /// Route segment used by the HTTP surface, e.g. `entity_tag`.
    pub fn path(&self) -> &'static str {
        match self {
            RecordKind::Entity => "entity",
            RecordKind::Edge => "edge",
            RecordKind::EntityTag => "entity_tag",
            RecordKind::EdgeTag => "edge_tag",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RecordKind::Entity => write!(f, "Entity"),
            RecordKind::Edge => write!(f, "Edge"),
            RecordKind::EntityTag => write!(f, "EntityTag"),
            RecordKind::EdgeTag => write!(f, "EdgeTag"),
        }
    }
}

/// Identity and timestamps shared by every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl RecordMeta {
    pub fn with_id(id: impl Into<String>) -> Self {
        RecordMeta {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub meta: RecordMeta,
    pub asset: Asset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub meta: RecordMeta,
    pub relation: Relation,
    pub from_entity: String,
    pub to_entity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityTag {
    pub meta: RecordMeta,
    pub property: Property,
    pub entity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeTag {
    pub meta: RecordMeta,
    pub property: Property,
    pub edge: String,
}

impl Entity {
    pub fn new(asset: Asset) -> Self {
        Entity {
            meta: RecordMeta::default(),
            asset,
        }
    }
}

impl Edge {
    pub fn new(relation: Relation, from_entity: impl Into<String>, to_entity: impl Into<String>) -> Self {
        Edge {
            meta: RecordMeta::default(),
            relation,
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
        }
    }
}

impl EntityTag {
    pub fn new(property: Property, entity: impl Into<String>) -> Self {
        EntityTag {
            meta: RecordMeta::default(),
            property,
            entity: entity.into(),
        }
    }
}

impl EdgeTag {
    pub fn new(property: Property, edge: impl Into<String>) -> Self {
        EdgeTag {
            meta: RecordMeta::default(),
            property,
            edge: edge.into(),
        }
    }
}

// Output shapes. `type` is always taken from the payload.

#[derive(Serialize)]
struct EntityOut<'a> {
    #[serde(flatten)]
    meta: &'a RecordMeta,
    #[serde(rename = "type")]
    kind: AssetKind,
    asset: &'a Asset,
}

#[derive(Serialize)]
struct EdgeOut<'a> {
    #[serde(flatten)]
    meta: &'a RecordMeta,
    #[serde(rename = "type")]
    kind: RelationKind,
    relation: &'a Relation,
    from_entity: &'a str,
    to_entity: &'a str,
}

#[derive(Serialize)]
struct EntityTagOut<'a> {
    #[serde(flatten)]
    meta: &'a RecordMeta,
    #[serde(rename = "type")]
    kind: PropertyKind,
    property: &'a Property,
    entity: &'a str,
}

#[derive(Serialize)]
struct EdgeTagOut<'a> {
    #[serde(flatten)]
    meta: &'a RecordMeta,
    #[serde(rename = "type")]
    kind: PropertyKind,
    property: &'a Property,
    edge: &'a str,
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EntityOut {
            meta: &self.meta,
            kind: self.asset.kind(),
            asset: &self.asset,
        }
        .serialize(serializer)
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EdgeOut {
            meta: &self.meta,
            kind: self.relation.kind(),
            relation: &self.relation,
            from_entity: &self.from_entity,
            to_entity: &self.to_entity,
        }
        .serialize(serializer)
    }
}

impl Serialize for EntityTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EntityTagOut {
            meta: &self.meta,
            kind: self.property.kind(),
            property: &self.property,
            entity: &self.entity,
        }
        .serialize(serializer)
    }
}

impl Serialize for EdgeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EdgeTagOut {
            meta: &self.meta,
            kind: self.property.kind(),
            property: &self.property,
            edge: &self.edge,
        }
        .serialize(serializer)
    }
}

/// Envelope as read off the wire, before its payload is resolved.
///
/// Every field is optional here; which absences are errors depends on the decode mode.
pub trait WireEnvelope {
    type Payload: Payload;
    type Record;

    /// The envelope ID, if present and non-empty.
    fn id(&self) -> Option<&str>;
    fn discriminator(&self) -> Option<&str>;
    /// The captured payload document. A JSON `null` is reported as absent.
    fn payload(&self) -> Option<&RawValue>;
    /// Name of the first absent back-reference field, in wire order.
    fn missing_reference(&self) -> Option<&'static str>;
    fn into_record(self, payload: Self::Payload) -> Result<Self::Record, RelayError>;
}

fn meta(
    id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
) -> RecordMeta {
    RecordMeta {
        id: id.filter(|id| !id.is_empty()),
        created_at,
        last_seen,
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, RelayError> {
    value.ok_or_else(|| RelayError::MissingRequiredField(field.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct EntityWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_seen: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    asset: Option<Box<RawValue>>,
}

impl WireEnvelope for EntityWire {
    type Payload = Asset;
    type Record = Entity;

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn discriminator(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn payload(&self) -> Option<&RawValue> {
        self.asset.as_deref()
    }

    fn missing_reference(&self) -> Option<&'static str> {
        None
    }

    fn into_record(self, asset: Asset) -> Result<Entity, RelayError> {
        Ok(Entity {
            meta: meta(self.id, self.created_at, self.last_seen),
            asset,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EdgeWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_seen: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    relation: Option<Box<RawValue>>,
    #[serde(default, alias = "from")]
    from_entity: Option<String>,
    #[serde(default, alias = "to")]
    to_entity: Option<String>,
}

impl WireEnvelope for EdgeWire {
    type Payload = Relation;
    type Record = Edge;

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn discriminator(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn payload(&self) -> Option<&RawValue> {
        self.relation.as_deref()
    }

    fn missing_reference(&self) -> Option<&'static str> {
        if self.from_entity.is_none() {
            Some("from_entity")
        } else if self.to_entity.is_none() {
            Some("to_entity")
        } else {
            None
        }
    }

    fn into_record(self, relation: Relation) -> Result<Edge, RelayError> {
        Ok(Edge {
            from_entity: required(self.from_entity, "from_entity")?,
            to_entity: required(self.to_entity, "to_entity")?,
            meta: meta(self.id, self.created_at, self.last_seen),
            relation,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EntityTagWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_seen: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    property: Option<Box<RawValue>>,
    #[serde(default, alias = "target")]
    entity: Option<String>,
}

impl WireEnvelope for EntityTagWire {
    type Payload = Property;
    type Record = EntityTag;

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn discriminator(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn payload(&self) -> Option<&RawValue> {
        self.property.as_deref()
    }

    fn missing_reference(&self) -> Option<&'static str> {
        self.entity.is_none().then_some("entity")
    }

    fn into_record(self, property: Property) -> Result<EntityTag, RelayError> {
        Ok(EntityTag {
            entity: required(self.entity, "entity")?,
            meta: meta(self.id, self.created_at, self.last_seen),
            property,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EdgeTagWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_seen: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    property: Option<Box<RawValue>>,
    #[serde(default, alias = "target")]
    edge: Option<String>,
}

impl WireEnvelope for EdgeTagWire {
    type Payload = Property;
    type Record = EdgeTag;

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    fn discriminator(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    fn payload(&self) -> Option<&RawValue> {
        self.property.as_deref()
    }

    fn missing_reference(&self) -> Option<&'static str> {
        self.edge.is_none().then_some("edge")
    }

    fn into_record(self, property: Property) -> Result<EdgeTag, RelayError> {
        Ok(EdgeTag {
            edge: required(self.edge, "edge")?,
            meta: meta(self.id, self.created_at, self.last_seen),
            property,
        })
    }
}

//! Polymorphic envelope decoding and encoding.
//!
//! Envelopes carry a payload whose concrete schema is picked at runtime by the `type`
//! discriminator. Decoding happens in two steps: the envelope scalars are parsed and the payload
//! sub-document is captured as raw JSON, then the discriminator is resolved in the
//! [`TypeRegistry`] and the captured document is parsed with the factory it names.
//!
//! ## Key Components
//!
//! - [`Codec`] - decodes the four envelope kinds against an injected registry
//! - [`Envelope`] - what the codec, the store and the service need from a record type
//! - [`TypeRegistry`] - immutable discriminator → factory tables
//! - [`Intent`] - a decode result: upsert a record or delete one by ID
//!
//! ## Decode Modes
//!
//! - [`DecodeMode::Strict`] is used by the create/update endpoints. `type` must be present and
//!   registered, then the payload and every back-reference must be present, checked in that order.
//! - [`DecodeMode::Permissive`] is used by the emit endpoints. An envelope with an ID and no
//!   payload is a delete intent. An envelope with neither is rejected. Anything with a payload is
//!   then held to the strict rules.
//!
//! ```rust
//! use std::sync::Arc;
//! use asset_relay::codec::{Codec, DecodeMode, Entity, Intent, TypeRegistry};
//!
//! let codec = Codec::new(Arc::new(TypeRegistry::standard()));
//! let entity: Entity = codec
//!     .decode_strict(br#"{"type": "FQDN", "asset": {"name": "example.com"}}"#)
//!     .unwrap();
//! assert_eq!(entity.asset.key(), "example.com");
//!
//! let intent = codec
//!     .decode::<Entity>(br#"{"id": "e-1"}"#, DecodeMode::Permissive)
//!     .unwrap();
//! assert_eq!(intent, Intent::Delete("e-1".to_string()));
//! ```

use serde::{de::DeserializeOwned, Serialize};
use serde_json::value::RawValue;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::RelayError,
    model::{Asset, Payload, Property, Relation},
};

pub mod envelope;
pub mod registry;

pub use envelope::{
    Edge, EdgeTag, EdgeTagWire, EdgeWire, Entity, EntityTag, EntityTagWire, EntityWire,
    RecordKind, RecordMeta, WireEnvelope,
};
pub use registry::{KindCatalog, PayloadFactory, Registered, TypeRegistry, TypeRegistryBuilder};

/// A record type the codec can decode and the store can hold.
pub trait Envelope: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static {
    type Payload: Registered;
    type Wire: WireEnvelope<Payload = Self::Payload, Record = Self> + DeserializeOwned;

    const RECORD: RecordKind;
    /// Wire name of the payload field, reported by `MissingRequiredField`.
    const PAYLOAD_FIELD: &'static str;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;
    fn payload(&self) -> &Self::Payload;

    /// The records this one points at, in wire order.
    fn references(&self) -> Vec<(RecordKind, &str)>;

    fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }

    /// Same payload and same references. Identity and timestamps are ignored.
    fn same_content(&self, other: &Self) -> bool {
        self.payload() == other.payload() && self.references() == other.references()
    }
}

impl Envelope for Entity {
    type Payload = Asset;
    type Wire = EntityWire;
    const RECORD: RecordKind = RecordKind::Entity;
    const PAYLOAD_FIELD: &'static str = "asset";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn payload(&self) -> &Asset {
        &self.asset
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        vec![]
    }
}

impl Envelope for Edge {
    type Payload = Relation;
    type Wire = EdgeWire;
    const RECORD: RecordKind = RecordKind::Edge;
    const PAYLOAD_FIELD: &'static str = "relation";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn payload(&self) -> &Relation {
        &self.relation
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        vec![
            (RecordKind::Entity, self.from_entity.as_str()),
            (RecordKind::Entity, self.to_entity.as_str()),
        ]
    }
}

impl Envelope for EntityTag {
    type Payload = Property;
    type Wire = EntityTagWire;
    const RECORD: RecordKind = RecordKind::EntityTag;
    const PAYLOAD_FIELD: &'static str = "property";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn payload(&self) -> &Property {
        &self.property
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        vec![(RecordKind::Entity, self.entity.as_str())]
    }
}

impl Envelope for EdgeTag {
    type Payload = Property;
    type Wire = EdgeTagWire;
    const RECORD: RecordKind = RecordKind::EdgeTag;
    const PAYLOAD_FIELD: &'static str = "property";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn payload(&self) -> &Property {
        &self.property
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        vec![(RecordKind::Edge, self.edge.as_str())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    #[default]
    Strict,
    Permissive,
}

/// What a decoded envelope asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent<E> {
    Upsert(E),
    Delete(String),
}

impl<E: Envelope> Intent<E> {
    pub fn id(&self) -> Option<&str> {
        match self {
            Intent::Upsert(record) => record.id(),
            Intent::Delete(id) => Some(id),
        }
    }
}

#[derive(Clone)]
pub struct Codec {
    registry: Arc<TypeRegistry>,
}

impl Codec {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Codec { registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn decode<E: Envelope>(
        &self,
        bytes: &[u8],
        mode: DecodeMode,
    ) -> Result<Intent<E>, RelayError> {
        let wire = Self::read_wire::<E>(bytes)?;
        if mode == DecodeMode::Permissive && wire.payload().is_none() {
            return match wire.id() {
                Some(id) => {
                    tracing::debug!("[Codec::decode] {} delete intent for {}", E::RECORD, id);
                    Ok(Intent::Delete(id.to_string()))
                }
                None => Err(RelayError::EmptyEnvelope),
            };
        }
        self.resolve_record::<E>(wire).map(Intent::Upsert)
    }

    /// Decode a create/update body. Never yields a delete intent.
    pub fn decode_strict<E: Envelope>(&self, bytes: &[u8]) -> Result<E, RelayError> {
        self.resolve_record::<E>(Self::read_wire::<E>(bytes)?)
    }

    pub fn decode_emit<E: Envelope>(&self, bytes: &[u8]) -> Result<Intent<E>, RelayError> {
        self.decode(bytes, DecodeMode::Permissive)
    }

    fn read_wire<E: Envelope>(bytes: &[u8]) -> Result<E::Wire, RelayError> {
        serde_json::from_slice(bytes).map_err(|e| RelayError::MalformedEnvelope(e.to_string()))
    }

    fn resolve_record<E: Envelope>(&self, wire: E::Wire) -> Result<E, RelayError> {
        let declared = wire
            .discriminator()
            .ok_or_else(|| RelayError::MissingRequiredField("type".to_string()))?
            .to_string();
        let factory = self.registry.resolve::<E::Payload>(&declared)?;
        let raw = wire
            .payload()
            .ok_or_else(|| RelayError::MissingRequiredField(E::PAYLOAD_FIELD.to_string()))?;
        if let Some(field) = wire.missing_reference() {
            return Err(RelayError::MissingRequiredField(field.to_string()));
        }
        let payload = Self::build_payload(factory, &declared, raw)?;
        wire.into_record(payload)
    }

    /// Resolve `declared`, parse `raw` with its factory, and check the result agrees with it.
    pub fn parse_payload<P: Registered>(
        &self,
        declared: &str,
        raw: &RawValue,
    ) -> Result<P, RelayError> {
        let factory = self.registry.resolve::<P>(declared)?;
        Self::build_payload(factory, declared, raw)
    }

    fn build_payload<P: Registered>(
        factory: PayloadFactory<P>,
        declared: &str,
        raw: &RawValue,
    ) -> Result<P, RelayError> {
        let payload = factory(raw).map_err(|e| RelayError::MalformedPayload {
            kind: declared.to_string(),
            reason: e.to_string(),
        })?;
        let actual = payload.kind().to_string();
        if actual != declared {
            return Err(RelayError::DiscriminatorMismatch {
                domain: P::DOMAIN,
                declared: declared.to_string(),
                actual,
            });
        }
        Ok(payload)
    }
}

/// Canonical JSON for a record. `type` is recomputed from the payload.
pub fn encode<E: Envelope>(record: &E) -> Result<String, RelayError> {
    Ok(serde_json::to_string(record)?)
}

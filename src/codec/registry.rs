// Type registry for polymorphic payloads
//
// Maps a discriminator value to the factory that parses the payload it selects. One table per
// discriminator domain. The registry is assembled once through `TypeRegistry::builder()` and is
// immutable afterwards; share it behind an `Arc` and read it from any thread without locking.

use serde::Serialize;
use serde_json::value::RawValue;
use std::collections::HashMap;

use crate::{
    error::RelayError,
    model::{Asset, AssetKind, Payload, Property, PropertyKind, Relation, RelationKind},
};

/// Parses a captured payload document into one variant of the domain's sum type.
pub type PayloadFactory<P> = fn(&RawValue) -> Result<P, serde_json::Error>;

/// Builds a [`PayloadFactory`] that deserializes the variant's inner struct and wraps it.
macro_rules! factory {
    ($variant:path) => {
        |raw: &RawValue| serde_json::from_str(raw.get()).map($variant)
    };
}

/// Discriminator → factory table for a single domain.
pub struct KindTable<P: Payload>(HashMap<P::Kind, PayloadFactory<P>>);

impl<P: Payload> Default for KindTable<P> {
    fn default() -> Self {
        KindTable(HashMap::new())
    }
}

impl<P: Payload> KindTable<P> {
    fn insert(&mut self, kind: P::Kind, factory: PayloadFactory<P>) {
        if self.0.insert(kind, factory).is_some() {
            tracing::info!(
                "[TypeRegistry::register] Overwriting existing {} factory: {}",
                P::DOMAIN,
                kind
            );
        }
    }

    fn get(&self, kind: &P::Kind) -> Option<PayloadFactory<P>> {
        self.0.get(kind).copied()
    }

    fn kinds(&self) -> Vec<P::Kind> {
        let mut kinds = self.0.keys().copied().collect::<Vec<_>>();
        kinds.sort();
        kinds
    }
}

/// Payload domains that have a table in the [`TypeRegistry`].
pub trait Registered: Payload {
    fn table(registry: &TypeRegistry) -> &KindTable<Self>;
    fn table_mut(registry: &mut TypeRegistry) -> &mut KindTable<Self>;
}

impl Registered for Asset {
    fn table(registry: &TypeRegistry) -> &KindTable<Self> {
        &registry.assets
    }

    fn table_mut(registry: &mut TypeRegistry) -> &mut KindTable<Self> {
        &mut registry.assets
    }
}

impl Registered for Relation {
    fn table(registry: &TypeRegistry) -> &KindTable<Self> {
        &registry.relations
    }

    fn table_mut(registry: &mut TypeRegistry) -> &mut KindTable<Self> {
        &mut registry.relations
    }
}

impl Registered for Property {
    fn table(registry: &TypeRegistry) -> &KindTable<Self> {
        &registry.properties
    }

    fn table_mut(registry: &mut TypeRegistry) -> &mut KindTable<Self> {
        &mut registry.properties
    }
}

/// Registered discriminators of every domain, as served by `GET /kinds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCatalog {
    pub asset: Vec<AssetKind>,
    pub relation: Vec<RelationKind>,
    pub property: Vec<PropertyKind>,
}

/// Immutable discriminator tables for assets, relations and properties.
///
/// [`TypeRegistry::resolve`] is the only place an unsupported discriminator is detected, so every
/// envelope kind reports it with the same [`RelayError::UnsupportedDiscriminator`] shape.
#[derive(Default)]
pub struct TypeRegistry {
    assets: KindTable<Asset>,
    relations: KindTable<Relation>,
    properties: KindTable<Property>,
}

/// Accumulates registrations before the registry is frozen.
#[derive(Default)]
pub struct TypeRegistryBuilder(TypeRegistry);

impl TypeRegistryBuilder {
    /// Register a factory for a discriminator. Registering a kind twice replaces its factory.
    pub fn register<P: Registered>(mut self, kind: P::Kind, factory: PayloadFactory<P>) -> Self {
        P::table_mut(&mut self.0).insert(kind, factory);
        self
    }

    pub fn build(self) -> TypeRegistry {
        let registry = self.0;
        tracing::debug!(
            "[TypeRegistry::build] {} asset, {} relation, {} property kinds registered",
            registry.assets.0.len(),
            registry.relations.0.len(),
            registry.properties.0.len()
        );
        registry
    }
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Registry with every built-in asset, relation and property kind.
    pub fn standard() -> Self {
        TypeRegistry::builder()
            .register::<Asset>(AssetKind::Account, factory!(Asset::Account))
            .register::<Asset>(AssetKind::AutnumRecord, factory!(Asset::AutnumRecord))
            .register::<Asset>(
                AssetKind::AutonomousSystem,
                factory!(Asset::AutonomousSystem),
            )
            .register::<Asset>(AssetKind::ContactRecord, factory!(Asset::ContactRecord))
            .register::<Asset>(AssetKind::DomainRecord, factory!(Asset::DomainRecord))
            .register::<Asset>(AssetKind::File, factory!(Asset::File))
            .register::<Asset>(AssetKind::Fqdn, factory!(Asset::Fqdn))
            .register::<Asset>(AssetKind::FundsTransfer, factory!(Asset::FundsTransfer))
            .register::<Asset>(AssetKind::Identifier, factory!(Asset::Identifier))
            .register::<Asset>(AssetKind::IpAddress, factory!(Asset::IpAddress))
            .register::<Asset>(AssetKind::IpNetRecord, factory!(Asset::IpNetRecord))
            .register::<Asset>(AssetKind::Location, factory!(Asset::Location))
            .register::<Asset>(AssetKind::Netblock, factory!(Asset::Netblock))
            .register::<Asset>(AssetKind::Organization, factory!(Asset::Organization))
            .register::<Asset>(AssetKind::Person, factory!(Asset::Person))
            .register::<Asset>(AssetKind::Phone, factory!(Asset::Phone))
            .register::<Asset>(AssetKind::Product, factory!(Asset::Product))
            .register::<Asset>(AssetKind::ProductRelease, factory!(Asset::ProductRelease))
            .register::<Asset>(AssetKind::Service, factory!(Asset::Service))
            .register::<Asset>(AssetKind::TlsCertificate, factory!(Asset::TlsCertificate))
            .register::<Asset>(AssetKind::Url, factory!(Asset::Url))
            .register::<Relation>(
                RelationKind::BasicDnsRelation,
                factory!(Relation::BasicDnsRelation),
            )
            .register::<Relation>(RelationKind::PortRelation, factory!(Relation::PortRelation))
            .register::<Relation>(
                RelationKind::PrefDnsRelation,
                factory!(Relation::PrefDnsRelation),
            )
            .register::<Relation>(
                RelationKind::SimpleRelation,
                factory!(Relation::SimpleRelation),
            )
            .register::<Relation>(
                RelationKind::SrvDnsRelation,
                factory!(Relation::SrvDnsRelation),
            )
            .register::<Property>(
                PropertyKind::DnsRecordProperty,
                factory!(Property::DnsRecordProperty),
            )
            .register::<Property>(
                PropertyKind::SimpleProperty,
                factory!(Property::SimpleProperty),
            )
            .register::<Property>(
                PropertyKind::SourceProperty,
                factory!(Property::SourceProperty),
            )
            .register::<Property>(PropertyKind::VulnProperty, factory!(Property::VulnProperty))
            .build()
    }

    /// Look up the factory for a discriminator value in domain `P`.
    ///
    /// A value that names no kind and a kind without a registered factory fail identically.
    pub fn resolve<P: Registered>(&self, value: &str) -> Result<PayloadFactory<P>, RelayError> {
        value
            .parse::<P::Kind>()
            .ok()
            .and_then(|kind| P::table(self).get(&kind))
            .ok_or_else(|| RelayError::UnsupportedDiscriminator {
                domain: P::DOMAIN,
                value: value.to_string(),
            })
    }

    /// Registered kinds of domain `P`, in declaration order.
    pub fn kinds<P: Registered>(&self) -> Vec<P::Kind> {
        P::table(self).kinds()
    }

    pub fn contains<P: Registered>(&self, kind: P::Kind) -> bool {
        P::table(self).get(&kind).is_some()
    }

    pub fn catalog(&self) -> KindCatalog {
        KindCatalog {
            asset: self.kinds::<Asset>(),
            relation: self.kinds::<Relation>(),
            property: self.kinds::<Property>(),
        }
    }
}

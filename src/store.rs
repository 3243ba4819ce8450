//! Graph persistence contract and an in-memory implementation.
//!
//! The relay treats persistence as a collaborator: it needs find, create (which is also upsert
//! when the record already carries an ID) and delete for each record kind, and relies on the
//! store for its own consistency. [`MemoryStore`] is the reference implementation used by the
//! binary and the tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use crate::codec::{Edge, EdgeTag, Entity, EntityTag, Envelope, RecordKind, RecordMeta};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("Rejected by store: {0}")]
    Validation(String),
    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(kind: RecordKind, id: &str) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn find_entity(&self, id: &str) -> Result<Entity, StoreError>;
    async fn create_entity(&self, entity: Entity) -> Result<Entity, StoreError>;
    async fn delete_entity(&self, id: &str) -> Result<(), StoreError>;

    async fn find_edge(&self, id: &str) -> Result<Edge, StoreError>;
    async fn create_edge(&self, edge: Edge) -> Result<Edge, StoreError>;
    async fn delete_edge(&self, id: &str) -> Result<(), StoreError>;

    async fn find_entity_tag(&self, id: &str) -> Result<EntityTag, StoreError>;
    async fn create_entity_tag(&self, tag: EntityTag) -> Result<EntityTag, StoreError>;
    async fn delete_entity_tag(&self, id: &str) -> Result<(), StoreError>;

    async fn find_edge_tag(&self, id: &str) -> Result<EdgeTag, StoreError>;
    async fn create_edge_tag(&self, tag: EdgeTag) -> Result<EdgeTag, StoreError>;
    async fn delete_edge_tag(&self, id: &str) -> Result<(), StoreError>;

    /// Whether a record of `kind` with `id` exists. Backend failures are passed through.
    async fn exists(&self, kind: RecordKind, id: &str) -> Result<bool, StoreError> {
        let found = match kind {
            RecordKind::Entity => self.find_entity(id).await.map(drop),
            RecordKind::Edge => self.find_edge(id).await.map(drop),
            RecordKind::EntityTag => self.find_entity_tag(id).await.map(drop),
            RecordKind::EdgeTag => self.find_edge_tag(id).await.map(drop),
        };
        match found {
            Ok(()) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Routes a record type to its [`GraphStore`] methods.
#[async_trait]
pub trait Persist: Envelope {
    async fn find(store: &dyn GraphStore, id: &str) -> Result<Self, StoreError>;
    async fn create(store: &dyn GraphStore, record: Self) -> Result<Self, StoreError>;
    async fn delete(store: &dyn GraphStore, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl Persist for Entity {
    async fn find(store: &dyn GraphStore, id: &str) -> Result<Self, StoreError> {
        store.find_entity(id).await
    }

    async fn create(store: &dyn GraphStore, record: Self) -> Result<Self, StoreError> {
        store.create_entity(record).await
    }

    async fn delete(store: &dyn GraphStore, id: &str) -> Result<(), StoreError> {
        store.delete_entity(id).await
    }
}

#[async_trait]
impl Persist for Edge {
    async fn find(store: &dyn GraphStore, id: &str) -> Result<Self, StoreError> {
        store.find_edge(id).await
    }

    async fn create(store: &dyn GraphStore, record: Self) -> Result<Self, StoreError> {
        store.create_edge(record).await
    }

    async fn delete(store: &dyn GraphStore, id: &str) -> Result<(), StoreError> {
        store.delete_edge(id).await
    }
}

#[async_trait]
impl Persist for EntityTag {
    async fn find(store: &dyn GraphStore, id: &str) -> Result<Self, StoreError> {
        store.find_entity_tag(id).await
    }

    async fn create(store: &dyn GraphStore, record: Self) -> Result<Self, StoreError> {
        store.create_entity_tag(record).await
    }

    async fn delete(store: &dyn GraphStore, id: &str) -> Result<(), StoreError> {
        store.delete_entity_tag(id).await
    }
}

#[async_trait]
impl Persist for EdgeTag {
    async fn find(store: &dyn GraphStore, id: &str) -> Result<Self, StoreError> {
        store.find_edge_tag(id).await
    }

    async fn create(store: &dyn GraphStore, record: Self) -> Result<Self, StoreError> {
        store.create_edge_tag(record).await
    }

    async fn delete(store: &dyn GraphStore, id: &str) -> Result<(), StoreError> {
        store.delete_edge_tag(id).await
    }
}

type Table<E> = RwLock<HashMap<String, E>>;

/// In-process store. Locks are always taken in the order entities, edges, entity tags, edge tags.
#[derive(Default)]
pub struct MemoryStore {
    entities: Table<Entity>,
    edges: Table<Edge>,
    entity_tags: Table<EntityTag>,
    edge_tags: Table<EdgeTag>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, per kind.
    pub fn len(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Entity => self.entities.read().len(),
            RecordKind::Edge => self.edges.read().len(),
            RecordKind::EntityTag => self.entity_tags.read().len(),
            RecordKind::EdgeTag => self.edge_tags.read().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        RecordKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }
}

fn find<E: Envelope>(table: &Table<E>, id: &str) -> Result<E, StoreError> {
    table
        .read()
        .get(id)
        .cloned()
        .ok_or_else(|| StoreError::not_found(E::RECORD, id))
}

fn remove<E: Envelope>(table: &Table<E>, id: &str) -> Result<(), StoreError> {
    match table.write().remove(id) {
        Some(_) => {
            tracing::debug!("[MemoryStore::delete] {} {}", E::RECORD, id);
            Ok(())
        }
        None => Err(StoreError::not_found(E::RECORD, id)),
    }
}

/// Assign an ID if needed, keep `created_at` of the record being replaced and move `last_seen`.
fn stamp(meta: &mut RecordMeta, previous: Option<&RecordMeta>) -> String {
    let now = Utc::now();
    let id = meta
        .id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    meta.id = Some(id.clone());
    meta.created_at = Some(previous.and_then(|p| p.created_at).unwrap_or(now));
    meta.last_seen = Some(now);
    id
}

fn insert<E: Envelope>(table: &mut HashMap<String, E>, mut record: E) -> E {
    let previous = record.id().and_then(|id| table.get(id)).map(|r| r.meta().clone());
    let id = stamp(record.meta_mut(), previous.as_ref());
    tracing::debug!(
        "[MemoryStore::create] {} {} ({})",
        E::RECORD,
        id,
        if previous.is_some() { "replaced" } else { "new" }
    );
    table.insert(id, record.clone());
    record
}

fn require<E>(table: &HashMap<String, E>, kind: RecordKind, id: &str) -> Result<(), StoreError> {
    if table.contains_key(id) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!("{kind} '{id}' does not exist")))
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn find_entity(&self, id: &str) -> Result<Entity, StoreError> {
        find(&self.entities, id)
    }

    async fn create_entity(&self, entity: Entity) -> Result<Entity, StoreError> {
        Ok(insert(&mut self.entities.write(), entity))
    }

    async fn delete_entity(&self, id: &str) -> Result<(), StoreError> {
        remove(&self.entities, id)
    }

    async fn find_edge(&self, id: &str) -> Result<Edge, StoreError> {
        find(&self.edges, id)
    }

    async fn create_edge(&self, edge: Edge) -> Result<Edge, StoreError> {
        let entities = self.entities.read();
        require(&entities, RecordKind::Entity, &edge.from_entity)?;
        require(&entities, RecordKind::Entity, &edge.to_entity)?;
        let mut edges = self.edges.write();
        Ok(insert(&mut edges, edge))
    }

    async fn delete_edge(&self, id: &str) -> Result<(), StoreError> {
        remove(&self.edges, id)
    }

    async fn find_entity_tag(&self, id: &str) -> Result<EntityTag, StoreError> {
        find(&self.entity_tags, id)
    }

    async fn create_entity_tag(&self, tag: EntityTag) -> Result<EntityTag, StoreError> {
        let entities = self.entities.read();
        require(&entities, RecordKind::Entity, &tag.entity)?;
        let mut tags = self.entity_tags.write();
        Ok(insert(&mut tags, tag))
    }

    async fn delete_entity_tag(&self, id: &str) -> Result<(), StoreError> {
        remove(&self.entity_tags, id)
    }

    async fn find_edge_tag(&self, id: &str) -> Result<EdgeTag, StoreError> {
        find(&self.edge_tags, id)
    }

    async fn create_edge_tag(&self, tag: EdgeTag) -> Result<EdgeTag, StoreError> {
        let edges = self.edges.read();
        require(&edges, RecordKind::Edge, &tag.edge)?;
        let mut tags = self.edge_tags.write();
        Ok(insert(&mut tags, tag))
    }

    async fn delete_edge_tag(&self, id: &str) -> Result<(), StoreError> {
        remove(&self.edge_tags, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{asset::Fqdn, relation::SimpleRelation, Asset, Relation};
    use test_log::test;

    fn fqdn(name: &str) -> Entity {
        Entity::new(Asset::Fqdn(Fqdn { name: name.into() }))
    }

    #[test(tokio::test)]
    async fn test_create_assigns_identity_and_timestamps() {
        let store = MemoryStore::new();
        let stored = store.create_entity(fqdn("example.com")).await.unwrap();

        let id = stored.meta.id.clone().unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert!(stored.meta.created_at.is_some());
        assert_eq!(stored.meta.created_at, stored.meta.last_seen);
        assert_eq!(store.find_entity(&id).await.unwrap(), stored);
    }

    #[test(tokio::test)]
    async fn test_upsert_preserves_created_at() {
        let store = MemoryStore::new();
        let first = store.create_entity(fqdn("example.com")).await.unwrap();

        let mut again = fqdn("www.example.com");
        again.meta.id = first.meta.id.clone();
        let second = store.create_entity(again).await.unwrap();

        assert_eq!(second.meta.id, first.meta.id);
        assert_eq!(second.meta.created_at, first.meta.created_at);
        assert!(second.meta.last_seen >= first.meta.last_seen);
        assert_eq!(store.len(RecordKind::Entity), 1);
    }

    #[test(tokio::test)]
    async fn test_edge_requires_both_entities() {
        let store = MemoryStore::new();
        let a = store.create_entity(fqdn("a.example")).await.unwrap();
        let a_id = a.meta.id.unwrap();

        let relation = Relation::SimpleRelation(SimpleRelation {
            name: "node".into(),
        });
        let err = store
            .create_edge(Edge::new(relation.clone(), a_id.clone(), "missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.len(RecordKind::Edge), 0);

        let edge = store
            .create_edge(Edge::new(relation, a_id.clone(), a_id))
            .await
            .unwrap();
        assert!(store
            .exists(RecordKind::Edge, edge.id().unwrap())
            .await
            .unwrap());
    }

    #[test(tokio::test)]
    async fn test_delete_does_not_cascade() {
        let store = MemoryStore::new();
        let a = store.create_entity(fqdn("a.example")).await.unwrap();
        let a_id = a.meta.id.unwrap();
        let edge = store
            .create_edge(Edge::new(
                Relation::SimpleRelation(SimpleRelation {
                    name: "node".into(),
                }),
                a_id.clone(),
                a_id.clone(),
            ))
            .await
            .unwrap();

        store.delete_entity(&a_id).await.unwrap();
        assert!(store.find_edge(edge.id().unwrap()).await.is_ok());
        assert_eq!(
            store.delete_entity(&a_id).await,
            Err(StoreError::not_found(RecordKind::Entity, &a_id))
        );
    }

    #[test(tokio::test)]
    async fn test_persist_dispatch() {
        let store = MemoryStore::new();
        let dyn_store: &dyn GraphStore = &store;
        let stored = Entity::create(dyn_store, fqdn("example.com")).await.unwrap();
        let id = stored.id().unwrap().to_string();

        assert_eq!(Entity::find(dyn_store, &id).await.unwrap(), stored);
        Entity::delete(dyn_store, &id).await.unwrap();
        assert!(!dyn_store.exists(RecordKind::Entity, &id).await.unwrap());
        assert!(store.is_empty());
    }
}

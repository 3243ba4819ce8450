//! Decode → validate references → write → publish → acknowledge.
//!
//! [`GraphService`] is transport independent; the HTTP handlers in [`crate::server`] are thin
//! wrappers over it. Writes and their publications go through one commit gate, so the order of
//! events on the bus is the order in which the store accepted the writes.

use serde::{Deserialize, Serialize};
use std::{fmt::Display, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    bus::ChangeBus,
    codec::{Codec, Intent, TypeRegistry},
    error::RelayError,
    event::{Change, EventKind},
    store::{GraphStore, Persist, StoreError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Upserted,
    Updated,
    Deleted,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::Upserted => write!(f, "upserted"),
            Action::Updated => write!(f, "updated"),
            Action::Deleted => write!(f, "deleted"),
        }
    }
}

/// Response to every mutating request: which record, and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub subject: String,
    pub action: Action,
}

impl Ack {
    fn new(subject: impl Into<String>, action: Action) -> Self {
        Ack {
            subject: subject.into(),
            action,
        }
    }
}

pub struct GraphService {
    codec: Codec,
    store: Arc<dyn GraphStore>,
    bus: ChangeBus,
    commit: Mutex<()>,
}

impl GraphService {
    pub fn new(registry: Arc<TypeRegistry>, store: Arc<dyn GraphStore>, bus: ChangeBus) -> Self {
        GraphService {
            codec: Codec::new(registry),
            store,
            bus,
            commit: Mutex::new(()),
        }
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.codec.registry()
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub async fn get<E: Persist>(&self, id: &str) -> Result<E, RelayError> {
        Ok(E::find(self.store.as_ref(), id).await?)
    }

    /// Strict create. A body carrying an ID upserts that record; without one the store assigns
    /// a fresh ID.
    pub async fn create<E: Persist>(&self, body: &[u8]) -> Result<Ack, RelayError> {
        let record: E = self.codec.decode_strict(body)?;
        if let Some(id) = record.id() {
            tracing::debug!("[GraphService::create] upserting {} {}", E::RECORD, id);
        }

        let _commit = self.commit.lock().await;
        self.check_references(&record).await?;
        let stored = E::create(self.store.as_ref(), record).await?;
        let subject = self.announce(Change::Created, &stored)?;
        Ok(Ack::new(subject, Action::Upserted))
    }

    /// Strict update of an existing record. The path ID wins over any ID in the body.
    pub async fn update<E: Persist>(&self, id: &str, body: &[u8]) -> Result<Ack, RelayError> {
        let mut record: E = self.codec.decode_strict(body)?;
        record.meta_mut().id = Some(id.to_string());

        let _commit = self.commit.lock().await;
        E::find(self.store.as_ref(), id).await?;
        self.check_references(&record).await?;
        let stored = E::create(self.store.as_ref(), record).await?;
        let subject = self.announce(Change::Updated, &stored)?;
        Ok(Ack::new(subject, Action::Updated))
    }

    pub async fn delete<E: Persist>(&self, id: &str) -> Result<Ack, RelayError> {
        let _commit = self.commit.lock().await;
        let existing = E::find(self.store.as_ref(), id).await?;
        E::delete(self.store.as_ref(), id).await?;
        self.announce(Change::Deleted, &existing)?;
        Ok(Ack::new(id, Action::Deleted))
    }

    /// Permissive upsert or delete.
    ///
    /// An upsert of a known ID is `Touched` when nothing but `last_seen` changed and `Updated`
    /// otherwise; an upsert without a known ID is `Created`.
    pub async fn emit<E: Persist>(&self, body: &[u8]) -> Result<Ack, RelayError> {
        let record = match self.codec.decode_emit::<E>(body)? {
            Intent::Delete(id) => return self.delete::<E>(&id).await,
            Intent::Upsert(record) => record,
        };

        let _commit = self.commit.lock().await;
        self.check_references(&record).await?;
        let previous = match record.id() {
            Some(id) => match E::find(self.store.as_ref(), id).await {
                Ok(previous) => Some(previous),
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };
        let stored = E::create(self.store.as_ref(), record).await?;
        let change = match previous {
            None => Change::Created,
            Some(previous) if previous.same_content(&stored) => Change::Touched,
            Some(_) => Change::Updated,
        };
        let subject = self.announce(change, &stored)?;
        let action = match change {
            Change::Updated => Action::Updated,
            _ => Action::Upserted,
        };
        Ok(Ack::new(subject, action))
    }

    async fn check_references<E: Persist>(&self, record: &E) -> Result<(), RelayError> {
        for (kind, id) in record.references() {
            if !self.store.exists(kind, id).await? {
                tracing::debug!(
                    "[GraphService::check_references] {} references missing {} {}",
                    E::RECORD,
                    kind,
                    id
                );
                return Err(RelayError::ReferenceNotFound {
                    kind,
                    id: id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Publish the change and return the record's ID.
    fn announce<E: Persist>(&self, change: Change, record: &E) -> Result<String, RelayError> {
        let kind = EventKind::new(E::RECORD, change);
        let subject = record.id().unwrap_or_default().to_string();
        let delivered = self.bus.publish(kind, record)?;
        tracing::info!(
            "[GraphService] {} {} ({} subscribers)",
            kind,
            subject,
            delivered
        );
        Ok(subject)
    }
}

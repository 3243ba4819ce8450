//! # asset-relay
//!
//! An asset-graph API: entities, the relations between them, and tags attached to either, served
//! over HTTP, with every accepted change republished as a live event stream.
//!
//! ## Overview
//!
//! Two pieces do the real work:
//!
//! - a **polymorphic codec** that decodes envelopes whose payload schema is picked at runtime by a
//!   `type` discriminator, in a strict mode for create/update and a permissive mode for emit (where
//!   an envelope with an ID and no payload means "delete")
//! - a **change bus** that fans every mutation out to any number of live subscribers, each with
//!   its own bounded queue, and renders events as text event stream frames
//!
//! ## Architecture
//!
//! - **[`model`]**: Payload sum types (`Asset`, `Relation`, `Property`) and their discriminators
//! - **[`codec`]**: Envelopes, the `TypeRegistry`, and decode/encode
//! - **[`bus`]**: `ChangeBus` and `Subscription`
//! - **[`event`]**: Event labels and frame rendering
//! - **[`store`]**: The `GraphStore` contract and `MemoryStore`
//! - **[`service`]**: Decode → check references → write → publish → acknowledge
//! - **[`server`]**: axum routes and the `/events` SSE endpoint (feature `service`)
//! - **[`config`]**: TOML service configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use asset_relay::{
//!     bus::ChangeBus,
//!     codec::{Entity, TypeRegistry},
//!     service::{Action, GraphService},
//!     store::MemoryStore,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = ChangeBus::new(64);
//!     let service = GraphService::new(
//!         Arc::new(TypeRegistry::standard()),
//!         Arc::new(MemoryStore::new()),
//!         bus.clone(),
//!     );
//!     let mut events = bus.subscribe();
//!
//!     let ack = service
//!         .emit::<Entity>(br#"{"type": "FQDN", "asset": {"name": "example.com"}}"#)
//!         .await?;
//!     assert_eq!(ack.action, Action::Upserted);
//!
//!     let event = events.recv().await.unwrap();
//!     assert!(event.to_string().starts_with("event: EntityCreated\ndata: "));
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod model;
#[cfg(all(feature = "service", not(target_arch = "wasm32")))]
pub mod server;
pub mod service;
pub mod store;

pub use error::*;

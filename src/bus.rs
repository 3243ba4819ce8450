//! Fan-out of change events to live subscribers.
//!
//! Every subscriber owns a bounded queue. [`ChangeBus::publish`] serializes the record once and
//! enqueues the resulting event into each queue with a non-blocking `try_send`, all while holding
//! the subscriber-set lock. Registration and removal take the same lock, so every subscriber sees
//! publications in one global order and a subscriber registered after a publish never sees it.
//!
//! A subscriber whose queue is full is disconnected rather than skipped: it drains what it already
//! has and then its stream ends. Publishers never wait on consumers.

use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::Stream;

pub use tokio::sync::mpsc::error::TryRecvError;

use crate::{
    error::RelayError,
    event::{ChangeEvent, EventKind},
};

struct Subscribers {
    next_id: u64,
    senders: BTreeMap<u64, mpsc::Sender<ChangeEvent>>,
}

struct BusInner {
    capacity: usize,
    subscribers: Mutex<Subscribers>,
}

impl BusInner {
    fn remove(&self, id: u64) -> bool {
        self.subscribers.lock().senders.remove(&id).is_some()
    }
}

/// Shared handle to the live subscriber set. Clones refer to the same bus.
#[derive(Clone)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// A bus whose subscribers each buffer up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        ChangeBus {
            inner: Arc::new(BusInner {
                capacity: capacity.max(1),
                subscribers: Mutex::new(Subscribers {
                    next_id: 0,
                    senders: BTreeMap::new(),
                }),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = {
            let mut subscribers = self.inner.subscribers.lock();
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.senders.insert(id, tx);
            id
        };
        tracing::debug!("[ChangeBus::subscribe] subscriber {} registered", id);
        Subscription {
            id,
            rx,
            bus: self.inner.clone(),
            closed: false,
        }
    }

    /// Remove the subscription from the live set and close its channel. Events it had not yet
    /// received are discarded. Calling this more than once has no further effect.
    pub fn unsubscribe(&self, subscription: &mut Subscription) {
        subscription.close();
    }

    /// Enqueue one event for every subscriber registered right now and return how many accepted
    /// it. Subscribers whose queue is full are disconnected.
    pub fn publish<T: Serialize + ?Sized>(
        &self,
        kind: EventKind,
        record: &T,
    ) -> Result<usize, RelayError> {
        let event = ChangeEvent::new(kind, serde_json::to_string(record)?);

        let mut subscribers = self.inner.subscribers.lock();
        let mut delivered = 0;
        subscribers.senders.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    "[ChangeBus::publish] subscriber {} fell {} events behind, disconnecting",
                    id,
                    tx.max_capacity()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("[ChangeBus::publish] subscriber {} went away", id);
                false
            }
        });
        tracing::trace!("[ChangeBus::publish] {} delivered to {} subscribers", kind, delivered);
        Ok(delivered)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().senders.len()
    }

    /// Disconnect every subscriber. Their streams end once already-queued events are drained.
    pub fn close_all(&self) {
        let closed = std::mem::take(&mut self.inner.subscribers.lock().senders);
        if !closed.is_empty() {
            tracing::info!("[ChangeBus::close_all] closed {} subscriptions", closed.len());
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        ChangeBus::new(256)
    }
}

/// Receiving end of one subscriber. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<ChangeEvent>,
    bus: Arc<BusInner>,
    closed: bool,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once the subscription is closed and drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<ChangeEvent, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.bus.remove(self.id) {
            tracing::debug!("[Subscription::close] subscriber {} unsubscribed", self.id);
        }
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    /// True once this side closed, or the bus dropped the subscriber.
    pub fn is_closed(&self) -> bool {
        self.closed || self.rx.is_closed()
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ChangeEvent>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.closed && self.bus.remove(self.id) {
            tracing::debug!("[Subscription::drop] subscriber {} disconnected", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::RecordKind, event::Change};
    use serde_json::json;
    use test_log::test;

    const CREATED: EventKind = EventKind::new(RecordKind::Entity, Change::Created);
    const DELETED: EventKind = EventKind::new(RecordKind::Entity, Change::Deleted);

    #[test(tokio::test)]
    async fn test_publish_without_subscribers() {
        let bus = ChangeBus::new(4);
        assert_eq!(bus.publish(CREATED, &json!({"id": "e-1"})).unwrap(), 0);
    }

    #[test(tokio::test)]
    async fn test_fan_out_same_order() {
        let bus = ChangeBus::new(16);
        let mut subs: Vec<_> = (0..3).map(|_| bus.subscribe()).collect();

        for n in 0..5 {
            assert_eq!(bus.publish(CREATED, &json!({ "n": n })).unwrap(), 3);
        }

        for sub in subs.iter_mut() {
            for n in 0..5 {
                let event = sub.recv().await.unwrap();
                assert_eq!(event.kind, CREATED);
                assert_eq!(&*event.data, format!("{{\"n\":{n}}}"));
            }
            assert!(matches!(sub.try_recv(), Err(TryRecvError::Empty)));
        }
    }

    #[test(tokio::test)]
    async fn test_unsubscribe_discards_and_is_idempotent() {
        let bus = ChangeBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(CREATED, &json!({"id": "e-1"})).unwrap();
        bus.unsubscribe(&mut b);
        bus.unsubscribe(&mut b);
        assert!(b.is_closed());
        assert_eq!(bus.subscriber_count(), 1);

        assert_eq!(bus.publish(DELETED, &json!({"id": "e-1"})).unwrap(), 1);
        assert_eq!(b.recv().await, None);
        assert_eq!(a.recv().await.unwrap().kind, CREATED);
        assert_eq!(a.recv().await.unwrap().kind, DELETED);
    }

    #[test(tokio::test)]
    async fn test_slow_subscriber_disconnected() {
        let bus = ChangeBus::new(2);
        let mut fast = bus.subscribe();
        let mut slow = bus.subscribe();

        for n in 0..3 {
            bus.publish(CREATED, &json!({ "n": n })).unwrap();
            assert_eq!(fast.recv().await.unwrap().data.as_ref(), format!("{{\"n\":{n}}}"));
        }

        // The third publish overflowed the slow queue.
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(slow.recv().await.unwrap().data.as_ref(), "{\"n\":0}");
        assert_eq!(slow.recv().await.unwrap().data.as_ref(), "{\"n\":1}");
        assert_eq!(slow.recv().await, None);
        assert!(slow.is_closed());
    }

    #[test(tokio::test)]
    async fn test_drop_unsubscribes() {
        let bus = ChangeBus::new(2);
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test(tokio::test)]
    async fn test_close_all_ends_streams() {
        use tokio_stream::StreamExt;

        let bus = ChangeBus::new(4);
        let mut sub = bus.subscribe();
        bus.publish(CREATED, &json!({})).unwrap();
        bus.close_all();

        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(sub.next().await.map(|e| e.kind), Some(CREATED));
        assert_eq!(sub.next().await, None);
    }
}

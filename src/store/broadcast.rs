//! Snapshot fan-out to store subscribers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crossbeam::channel::Sender;
use serde_json::Value;

use super::{StoreError, StoreEvent, StoreSubscription};

/// Subscriber registry shared by the store implementations.
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<Mutex<SubscriberState>>,
}

#[derive(Default)]
struct SubscriberState {
    next_subscriber_id: u64,
    senders: BTreeMap<u64, Sender<StoreEvent>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand it `initial` before any later publish.
    pub fn subscribe(&self, initial: Value) -> Result<StoreSubscription, StoreError> {
        let mut state = self.lock_state()?;
        let (sender, receiver) = crossbeam::channel::unbounded();
        // Cannot fail: we hold the receiver.
        let _ = sender.send(StoreEvent::Snapshot(initial));
        let id = state.next_subscriber_id;
        state.next_subscriber_id = state.next_subscriber_id.saturating_add(1);
        state.senders.insert(id, sender);
        tracing::debug!(subscriber = id, "store subscriber registered");

        Ok(StoreSubscription {
            receiver,
            _registration: Registration {
                inner: Arc::downgrade(&self.inner),
                id,
            },
        })
    }

    pub fn publish(&self, snapshot: Value) -> Result<(), StoreError> {
        self.send_all(StoreEvent::Snapshot(snapshot))
    }

    pub fn publish_error(&self, error: StoreError) -> Result<(), StoreError> {
        self.send_all(StoreEvent::Error(error))
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_state()
            .map(|state| state.senders.len())
            .unwrap_or(0)
    }

    fn send_all(&self, event: StoreEvent) -> Result<(), StoreError> {
        let mut state = self.lock_state()?;
        let mut dropped = Vec::new();
        for (id, sender) in &state.senders {
            if sender.send(event.clone()).is_err() {
                dropped.push(*id);
            }
        }
        for id in dropped {
            state.senders.remove(&id);
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, SubscriberState>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Removes its subscriber from the registry when dropped.
pub(super) struct Registration {
    inner: Weak<Mutex<SubscriberState>>,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if let Ok(mut state) = inner.lock() {
            state.senders.remove(&self.id);
            tracing::debug!(subscriber = self.id, "store subscriber removed");
        }
    }
}

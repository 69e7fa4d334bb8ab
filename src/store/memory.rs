//! In-process realtime store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{RealtimeStore, StoreError, StoreSubscription, Subscribers};
use crate::api::{StoreRecord, StoreSnapshot};
use crate::core::BeadId;

/// Store that keeps entries in memory. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    entries: Mutex<StoreSnapshot>,
    subscribers: Subscribers,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already completed beads.
    pub fn with_done<I: IntoIterator<Item = BeadId>>(ids: I) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.inner.entries.lock() {
            let now = OffsetDateTime::now_utc();
            for id in ids {
                entries.insert(Uuid::now_v7().to_string(), StoreRecord::new(id, now));
            }
        }
        store
    }

    /// Make every following append fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful appends.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        Ok(self.lock_entries()?.clone())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.subscriber_count()
    }

    /// Push an arbitrary payload to subscribers without touching the entries,
    /// standing in for a remote writer that does not follow the record schema.
    pub fn publish_raw(&self, raw: Value) -> Result<(), StoreError> {
        let _entries = self.lock_entries()?;
        self.inner.subscribers.publish(raw)
    }

    /// Report a transport failure to subscribers.
    pub fn publish_error(&self, error: StoreError) -> Result<(), StoreError> {
        self.inner.subscribers.publish_error(error)
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, StoreSnapshot>, StoreError> {
        self.inner
            .entries
            .lock()
            .map_err(|_| StoreError::LockPoisoned)
    }
}

impl RealtimeStore for MemoryStore {
    fn append(&self, id: BeadId) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                reason: "store rejected the write".into(),
            });
        }

        let mut entries = self.lock_entries()?;
        entries.insert(
            Uuid::now_v7().to_string(),
            StoreRecord::new(id, OffsetDateTime::now_utc()),
        );
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let snapshot = snapshot_value(&entries)?;
        self.inner.subscribers.publish(snapshot)
    }

    fn subscribe(&self) -> Result<StoreSubscription, StoreError> {
        let entries = self.lock_entries()?;
        self.inner.subscribers.subscribe(snapshot_value(&entries)?)
    }
}

pub(super) fn snapshot_value(entries: &StoreSnapshot) -> Result<Value, StoreError> {
    serde_json::to_value(entries).map_err(|e| StoreError::WriteFailed {
        reason: format!("failed to encode snapshot: {e}"),
    })
}

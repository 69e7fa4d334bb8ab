//! Realtime set stores.
//!
//! A store records appended bead ids and pushes its *entire* contents to every
//! subscriber on each change, the way a realtime database value listener does.
//! Subscribers get the current contents immediately on subscribe.

mod broadcast;
mod file;
mod memory;

use std::path::PathBuf;

use crossbeam::channel::Receiver;
use serde_json::Value;
use thiserror::Error;

use crate::core::BeadId;
use crate::error::Transience;

pub use broadcast::Subscribers;
pub use file::FileStore;
pub use memory::MemoryStore;

/// What a subscription delivers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Entire current collection, untyped as the store hands it out.
    Snapshot(Value),
    /// Transport-level failure; the subscription stays open.
    Error(StoreError),
}

pub trait RealtimeStore: Send + Sync {
    /// Record a completed bead with the current timestamp.
    fn append(&self, id: BeadId) -> Result<(), StoreError>;

    /// Start listening. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> Result<StoreSubscription, StoreError>;
}

/// Live listener registration.
pub struct StoreSubscription {
    receiver: Receiver<StoreEvent>,
    _registration: broadcast::Registration,
}

impl StoreSubscription {
    pub fn receiver(&self) -> &Receiver<StoreEvent> {
        &self.receiver
    }

    /// Explicit form of dropping the subscription.
    pub fn unsubscribe(self) {}
}

#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum StoreError {
    #[error("store write failed: {reason}")]
    WriteFailed { reason: String },
    #[error("store io failed for {path}: {reason}")]
    Io { path: PathBuf, reason: String },
    #[error("store contents at {path} are not valid: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("store transport error: {reason}")]
    Transport { reason: String },
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn transience(&self) -> Transience {
        match self {
            StoreError::WriteFailed { .. } | StoreError::Transport { .. } => Transience::Retryable,
            StoreError::Io { .. } => Transience::Unknown,
            StoreError::Corrupt { .. } | StoreError::LockPoisoned => Transience::Permanent,
        }
    }
}

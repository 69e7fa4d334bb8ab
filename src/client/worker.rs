//! Blocking IO workers for the session loop.
//!
//! Each worker owns one collaborator, runs on a dedicated thread, receives
//! ops from the session thread and sends results back on a shared channel.

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};

use super::fetcher::{FetchError, PageFetcher};
use super::pagination::FetchRequest;
use crate::core::{BeadId, Page};
use crate::store::{RealtimeStore, StoreError};

/// Completed worker operation.
pub enum WorkerResult {
    Fetched {
        request: FetchRequest,
        result: Result<Page, FetchError>,
    },
    Persisted {
        id: BeadId,
        result: Result<(), StoreError>,
    },
}

/// Operations sent to the fetch thread.
pub enum FetchOp {
    Fetch(FetchRequest),
    Shutdown,
}

/// Operations sent to the store writer thread.
pub enum PersistOp {
    Append(BeadId),
    Shutdown,
}

pub struct FetchWorker {
    fetcher: Arc<dyn PageFetcher>,
    result_tx: Sender<WorkerResult>,
}

impl FetchWorker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, result_tx: Sender<WorkerResult>) -> Self {
        FetchWorker { fetcher, result_tx }
    }

    /// Returns false when the worker should stop.
    pub fn handle_op(&mut self, op: FetchOp) -> bool {
        match op {
            FetchOp::Fetch(request) => {
                let result = self.fetcher.fetch_page(request.cursor);
                // Session may already be gone.
                let _ = self
                    .result_tx
                    .send(WorkerResult::Fetched { request, result });
                true
            }
            FetchOp::Shutdown => false,
        }
    }
}

pub struct PersistWorker {
    store: Arc<dyn RealtimeStore>,
    result_tx: Sender<WorkerResult>,
}

impl PersistWorker {
    pub fn new(store: Arc<dyn RealtimeStore>, result_tx: Sender<WorkerResult>) -> Self {
        PersistWorker { store, result_tx }
    }

    /// Returns false when the worker should stop.
    pub fn handle_op(&mut self, op: PersistOp) -> bool {
        match op {
            PersistOp::Append(id) => {
                let result = self.store.append(id);
                let _ = self.result_tx.send(WorkerResult::Persisted { id, result });
                true
            }
            PersistOp::Shutdown => false,
        }
    }
}

pub fn run_fetch_loop(mut worker: FetchWorker, op_rx: Receiver<FetchOp>) {
    for op in op_rx {
        if !worker.handle_op(op) {
            break;
        }
    }
    tracing::debug!("fetch worker stopped");
}

pub fn run_persist_loop(mut worker: PersistWorker, op_rx: Receiver<PersistOp>) {
    for op in op_rx {
        if !worker.handle_op(op) {
            break;
        }
    }
    tracing::debug!("persist worker stopped");
}

//! Session thread loop.
//!
//! Three kinds of threads:
//! - Session thread - owns the reconciler and pagination state, processes
//!   store pushes, commands, timers and worker results sequentially
//! - Fetch worker - performs page fetches
//! - Persist worker - performs store appends
//!
//! Debounce timers report back to the session thread on their own channels.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use thiserror::Error;

use super::fetcher::{FetchError, PageFetcher};
use super::pagination::{
    ControlState, FetchRequest, PaginationDriver, PaginationTimer, QueryStatus,
};
use super::reconcile::{MarkOutcome, ReconcileTimer, Reconciler, TimerOutcome};
use super::view::RenderModel;
use super::worker::{
    FetchOp, FetchWorker, PersistOp, PersistWorker, WorkerResult, run_fetch_loop,
    run_persist_loop,
};
use crate::core::{BeadId, Cursor, Page};
use crate::error::Transience;
use crate::store::{RealtimeStore, StoreError, StoreEvent, StoreSubscription};

/// Longest a close waits for an in-flight store write.
const PERSIST_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Window shared by realtime updates, persist writes and load-more requests.
    pub debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Click(BeadId),
    FetchNext,
    FetchPrevious,
    SentinelVisibility(bool),
    Close,
}

/// Everything a frontend needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub ready: bool,
    pub status: QueryStatus,
    pub model: RenderModel,
    pub previous: ControlState,
    pub next: ControlState,
    pub background_fetching: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    PersistFailed { id: BeadId, message: String },
    SubscriptionError { message: String },
    FetchFailed { cursor: Cursor, message: String },
    MalformedEntries { rejected: usize },
    AlreadyDone { id: BeadId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Render(SessionView),
    Notice(Notice),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("failed to subscribe to the realtime store: {0}")]
    Subscribe(#[from] StoreError),
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("session is closed")]
    Closed,
}

impl SessionError {
    pub fn transience(&self) -> Transience {
        match self {
            SessionError::Subscribe(e) => e.transience(),
            SessionError::Spawn { .. } => Transience::Retryable,
            SessionError::Closed => Transience::Permanent,
        }
    }
}

/// Handle to a running session. Dropping it closes the session.
pub struct SessionHandle {
    command_tx: Option<Sender<Command>>,
    event_rx: Receiver<SessionEvent>,
    thread: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn send(&self, command: Command) -> Result<(), SessionError> {
        let tx = self.command_tx.as_ref().ok_or(SessionError::Closed)?;
        tx.send(command).map_err(|_| SessionError::Closed)
    }

    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.event_rx
    }

    /// Close the session and wait for its thread to finish.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(Command::Close);
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("session thread panicked");
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Subscribe to `store` and start the session threads.
pub fn spawn_session(
    store: Arc<dyn RealtimeStore>,
    fetcher: Arc<dyn PageFetcher>,
    config: SessionConfig,
) -> Result<SessionHandle, SessionError> {
    let subscription = store.subscribe()?;

    let (command_tx, command_rx) = channel::unbounded();
    let (event_tx, event_rx) = channel::unbounded();
    let (result_tx, result_rx) = channel::unbounded();
    let (fetch_tx, fetch_rx) = channel::unbounded();
    let (persist_tx, persist_rx) = channel::unbounded();
    let (reconcile_timer_tx, reconcile_timer_rx) = channel::unbounded();
    let (pagination_timer_tx, pagination_timer_rx) = channel::unbounded();

    let fetch_worker = FetchWorker::new(fetcher, result_tx.clone());
    spawn_named("japa-fetch", move || run_fetch_loop(fetch_worker, fetch_rx))?;
    let persist_worker = PersistWorker::new(store, result_tx);
    // Dropped when the writer exits, including by panic.
    let (persist_done_tx, persist_done_rx) = channel::bounded::<()>(0);
    let persist_thread = spawn_named("japa-persist", move || {
        let _done = persist_done_tx;
        run_persist_loop(persist_worker, persist_rx);
    })?;

    let session = Session {
        reconciler: Reconciler::new(reconcile_timer_tx, config.debounce),
        pagination: PaginationDriver::new(pagination_timer_tx, config.debounce),
        event_tx,
        fetch_tx,
        persist_tx,
        persist_worker: Some(WorkerThread {
            thread: persist_thread,
            done_rx: persist_done_rx,
        }),
    };
    let channels = LoopChannels {
        command_rx,
        result_rx,
        reconcile_timer_rx,
        pagination_timer_rx,
    };
    let thread = spawn_named("japa-session", move || {
        run_session_loop(session, subscription, channels)
    })?;

    Ok(SessionHandle {
        command_tx: Some(command_tx),
        event_rx,
        thread: Some(thread),
    })
}

fn spawn_named<F>(name: &'static str, f: F) -> Result<JoinHandle<()>, SessionError>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map_err(|source| SessionError::Spawn { name, source })
}

struct LoopChannels {
    command_rx: Receiver<Command>,
    result_rx: Receiver<WorkerResult>,
    reconcile_timer_rx: Receiver<ReconcileTimer>,
    pagination_timer_rx: Receiver<PaginationTimer>,
}

struct WorkerThread {
    thread: JoinHandle<()>,
    done_rx: Receiver<()>,
}

impl WorkerThread {
    /// Join once the worker exits, or give up after `timeout`.
    fn join_within(self, name: &'static str, timeout: Duration) {
        match self.done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(worker = name, "worker still busy at close, detaching");
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.thread.join().is_err() {
                    tracing::error!(worker = name, "worker thread panicked");
                }
            }
        }
    }
}

struct Session {
    reconciler: Reconciler,
    pagination: PaginationDriver,
    event_tx: Sender<SessionEvent>,
    fetch_tx: Sender<FetchOp>,
    persist_tx: Sender<PersistOp>,
    persist_worker: Option<WorkerThread>,
}

/// Run the session loop until closed.
///
/// Every state change goes through this thread; the view is recomputed from
/// current state on each render.
fn run_session_loop(mut session: Session, subscription: StoreSubscription, channels: LoopChannels) {
    let LoopChannels {
        command_rx,
        result_rx,
        reconcile_timer_rx,
        pagination_timer_rx,
    } = channels;
    let mut store_open = true;
    let mut workers_open = true;

    session.render();
    loop {
        let store_rx = if store_open {
            subscription.receiver().clone()
        } else {
            channel::never()
        };
        let worker_rx = if workers_open {
            result_rx.clone()
        } else {
            channel::never()
        };

        crossbeam::select! {
            recv(store_rx) -> msg => match msg {
                Ok(event) => session.handle_store_event(event),
                Err(_) => {
                    tracing::warn!("realtime subscription closed");
                    session.notify(Notice::SubscriptionError {
                        message: "subscription closed".to_string(),
                    });
                    store_open = false;
                }
            },
            recv(command_rx) -> msg => match msg {
                Ok(Command::Close) | Err(_) => break,
                Ok(command) => session.handle_command(command),
            },
            recv(reconcile_timer_rx) -> msg => {
                if let Ok(fired) = msg {
                    session.handle_reconcile_timer(fired);
                }
            },
            recv(pagination_timer_rx) -> msg => {
                if let Ok(fired) = msg {
                    session.handle_pagination_timer(fired);
                }
            },
            recv(worker_rx) -> msg => match msg {
                Ok(result) => session.handle_worker_result(result),
                Err(_) => workers_open = false,
            },
        }
    }

    subscription.unsubscribe();
    session.shutdown();
    tracing::debug!("session closed");
}

impl Session {
    fn handle_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Snapshot(raw) => {
                let rejected = self.reconciler.on_realtime_update(&raw);
                if rejected > 0 {
                    self.notify(Notice::MalformedEntries { rejected });
                }
            }
            StoreEvent::Error(err) => {
                tracing::warn!("realtime subscription error: {err}");
                self.notify(Notice::SubscriptionError {
                    message: err.to_string(),
                });
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Click(id) => match self.reconciler.mark_done(id) {
                MarkOutcome::Marked | MarkOutcome::Coalesced => self.render(),
                MarkOutcome::AlreadyDone => self.notify(Notice::AlreadyDone { id }),
            },
            Command::FetchNext => {
                if !self.pagination.fetch_next() {
                    tracing::debug!("fetch next ignored before first page");
                }
            }
            Command::FetchPrevious => {
                if !self.pagination.fetch_previous() {
                    tracing::debug!("fetch previous ignored before first page");
                }
            }
            Command::SentinelVisibility(visible) => {
                self.pagination.on_sentinel_visibility(visible);
            }
            Command::Close => {}
        }
    }

    fn handle_reconcile_timer(&mut self, fired: ReconcileTimer) {
        match self.reconciler.on_timer(fired) {
            TimerOutcome::Realtime(outcome) => {
                if outcome.became_ready {
                    let cursor = Cursor::resume_from(self.reconciler.done().len());
                    if let Some(request) = self.pagination.start(cursor) {
                        self.dispatch_fetch(request);
                    }
                }
                if outcome.changed || outcome.became_ready {
                    self.render();
                }
            }
            TimerOutcome::Persist(id) => {
                if self.persist_tx.send(PersistOp::Append(id)).is_err() {
                    self.persist_failed(id, "store writer stopped".to_string());
                }
            }
            TimerOutcome::Stale => {}
        }
    }

    fn handle_pagination_timer(&mut self, fired: PaginationTimer) {
        if let Some(request) = self.pagination.on_timer(fired) {
            self.dispatch_fetch(request);
            self.render();
        }
    }

    fn handle_worker_result(&mut self, result: WorkerResult) {
        match result {
            WorkerResult::Fetched { request, result } => self.complete_fetch(request, result),
            WorkerResult::Persisted { id, result: Ok(()) } => {
                tracing::debug!(%id, "bead persisted");
            }
            WorkerResult::Persisted {
                id,
                result: Err(err),
            } => self.persist_failed(id, err.to_string()),
        }
    }

    fn dispatch_fetch(&mut self, request: FetchRequest) {
        tracing::debug!(cursor = %request.cursor, kind = ?request.kind, "fetching page");
        if self.fetch_tx.send(FetchOp::Fetch(request)).is_err() {
            let err = FetchError::Transport {
                reason: "fetch worker stopped".to_string(),
            };
            self.complete_fetch(request, Err(err));
        }
    }

    fn complete_fetch(&mut self, request: FetchRequest, result: Result<Page, FetchError>) {
        let failure = result.as_ref().err().map(ToString::to_string);
        self.pagination.on_fetch_complete(request, result);
        if let Some(message) = failure {
            self.notify(Notice::FetchFailed {
                cursor: request.cursor,
                message,
            });
        }
        self.render();
    }

    /// The optimistic mark stays; the store is not retried.
    fn persist_failed(&mut self, id: BeadId, message: String) {
        tracing::error!(%id, "failed to persist bead: {message}");
        self.notify(Notice::PersistFailed { id, message });
    }

    fn view(&self) -> SessionView {
        SessionView {
            ready: self.reconciler.is_ready(),
            status: self.pagination.status().clone(),
            model: self.reconciler.view(self.pagination.pages()),
            previous: self.pagination.previous_control(),
            next: self.pagination.next_control(),
            background_fetching: self.pagination.is_background_fetching(),
        }
    }

    fn render(&self) {
        // Frontend may have stopped listening.
        let _ = self.event_tx.send(SessionEvent::Render(self.view()));
    }

    fn notify(&self, notice: Notice) {
        let _ = self.event_tx.send(SessionEvent::Notice(notice));
    }

    fn shutdown(&mut self) {
        self.reconciler.cancel_pending();
        self.pagination.cancel();
        let _ = self.fetch_tx.send(FetchOp::Shutdown);
        let _ = self.persist_tx.send(PersistOp::Shutdown);
        // Writes already handed to the worker finish before close returns.
        // Fetches are abandoned.
        if let Some(worker) = self.persist_worker.take() {
            worker.join_within("persist", PERSIST_DRAIN_TIMEOUT);
        }
    }
}

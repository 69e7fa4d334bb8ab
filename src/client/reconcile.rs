//! Reconciliation of realtime done-set pushes with local marks.
//!
//! The reconciler is the only writer of the done set and the selection.
//! Realtime pushes and persist requests both pass through its debouncer, so
//! a burst of pushes applies only the latest, and repeated marks of one bead
//! produce one write.

use std::time::Duration;

use crossbeam::channel::Sender;
use serde_json::Value;

use super::scheduler::{Debouncer, TimerFired};
use super::view::{RenderModel, merged_view};
use crate::api::ingest_snapshot;
use crate::core::{BeadId, DoneSet, Page};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReconcileKey {
    Realtime,
    Persist(BeadId),
}

pub type ReconcileTimer = TimerFired<ReconcileKey>;

enum Deferred {
    Realtime(DoneSet),
    Persist,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RealtimeOutcome {
    /// Held set was replaced.
    pub changed: bool,
    /// This push flipped the ready flag.
    pub became_ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Newly marked; a write is scheduled.
    Marked,
    /// A write for this bead was already pending; its window restarted.
    Coalesced,
    /// Already done and nothing pending; the control is disabled.
    AlreadyDone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOutcome {
    Realtime(RealtimeOutcome),
    /// Window elapsed; the caller performs the write.
    Persist(BeadId),
    /// Superseded or cancelled firing.
    Stale,
}

pub struct Reconciler {
    done: DoneSet,
    ready: bool,
    selected: Option<BeadId>,
    debouncer: Debouncer<ReconcileKey, Deferred>,
}

impl Reconciler {
    pub fn new(timer_tx: Sender<ReconcileTimer>, delay: Duration) -> Self {
        Self {
            done: DoneSet::new(),
            ready: false,
            selected: None,
            debouncer: Debouncer::new(timer_tx, delay),
        }
    }

    /// Ingest a raw store snapshot. The resulting candidate set is applied
    /// when the debounce window closes; returns the count of rejected entries.
    pub fn on_realtime_update(&mut self, raw: &Value) -> usize {
        let ingested = ingest_snapshot(raw);
        if ingested.rejected > 0 {
            tracing::debug!(
                rejected = ingested.rejected,
                "skipped malformed realtime entries"
            );
        }
        self.debouncer
            .schedule(ReconcileKey::Realtime, Deferred::Realtime(ingested.done));
        ingested.rejected
    }

    /// Replace the held set with `candidate` if it differs.
    pub fn apply_realtime(&mut self, candidate: DoneSet) -> RealtimeOutcome {
        let mut outcome = RealtimeOutcome::default();
        if !self.ready && !candidate.is_empty() {
            self.ready = true;
            outcome.became_ready = true;
            tracing::info!(done = candidate.len(), "done set ready");
        }
        if !self.done.same_members(&candidate) {
            tracing::debug!(
                held = self.done.len(),
                incoming = candidate.len(),
                "done set replaced"
            );
            self.done = candidate;
            outcome.changed = true;
        }
        outcome
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Select `id`, mark it done locally, and schedule its write.
    pub fn mark_done(&mut self, id: BeadId) -> MarkOutcome {
        let key = ReconcileKey::Persist(id);
        let pending = self.debouncer.is_pending(&key);
        if self.done.contains(id) && !pending {
            return MarkOutcome::AlreadyDone;
        }

        self.selected = Some(id);
        self.done.insert(id);
        self.debouncer.schedule(key, Deferred::Persist);
        if pending {
            MarkOutcome::Coalesced
        } else {
            MarkOutcome::Marked
        }
    }

    pub fn on_timer(&mut self, fired: ReconcileTimer) -> TimerOutcome {
        let key = fired.key;
        match (key, self.debouncer.fire(fired)) {
            (_, Some(Deferred::Realtime(candidate))) => {
                TimerOutcome::Realtime(self.apply_realtime(candidate))
            }
            (ReconcileKey::Persist(id), Some(Deferred::Persist)) => TimerOutcome::Persist(id),
            _ => TimerOutcome::Stale,
        }
    }

    pub fn has_pending_persist(&self, id: BeadId) -> bool {
        self.debouncer.is_pending(&ReconcileKey::Persist(id))
    }

    pub fn cancel_pending(&mut self) {
        self.debouncer.cancel_all();
    }

    pub fn done(&self) -> &DoneSet {
        &self.done
    }

    pub fn selected(&self) -> Option<BeadId> {
        self.selected
    }

    pub fn view(&self, pages: &[Page]) -> RenderModel {
        merged_view(pages, &self.done, self.selected)
    }
}

//! Counting session scenarios against an in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use japa::BeadId;
use japa::client::{
    Command, FetchError, LocalPageFetcher, Notice, PageFetcher, QueryStatus, SessionConfig,
    SessionEvent, SessionView, spawn_session,
};
use japa::core::{Cursor, Page};
use japa::store::{MemoryStore, RealtimeStore, StoreError, StoreSubscription};
use serde_json::json;

use crate::fixtures::session::{DEBOUNCE, SessionRig, id, ids};

fn first_bead(view: &SessionView) -> Option<u32> {
    view.model
        .pages
        .first()
        .and_then(|page| page.beads.first())
        .map(|bead| bead.id.get())
}

fn bead_disabled(view: &SessionView, raw: u32) -> bool {
    view.model
        .pages
        .iter()
        .flat_map(|page| &page.beads)
        .any(|bead| bead.id.get() == raw && bead.is_disabled)
}

#[test]
fn empty_store_never_becomes_ready() {
    let mut rig = SessionRig::start(MemoryStore::new());
    rig.settle(DEBOUNCE * 5);

    let view = rig.last_view();
    assert!(!view.ready);
    assert!(view.model.pages.is_empty());
    assert_eq!(view.model.done_count, 0);
}

#[test]
fn first_page_starts_at_done_count() {
    let mut rig = SessionRig::start(MemoryStore::with_done(ids(0..5)));
    let view = rig.wait_ready();

    assert_eq!(first_bead(&view), Some(5));
    assert_eq!(view.model.done_count, 5);
    assert_eq!(view.status, QueryStatus::Success);
    assert!(view.next.enabled);
}

#[test]
fn duplicate_store_entries_count_once() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(3), id(3), id(7)]));
    let view = rig.wait_ready();

    assert_eq!(view.model.done_count, 2);
    assert_eq!(first_bead(&view), Some(2));
    assert!(bead_disabled(&view, 3));
    assert!(bead_disabled(&view, 7));
}

#[test]
fn rapid_marks_of_one_bead_write_once() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.click(10);
    rig.click(10);
    rig.click(10);
    let view = rig.wait_view(|view| view.model.done_count == 2);
    assert!(bead_disabled(&view, 10));

    rig.settle(DEBOUNCE * 5);
    assert_eq!(rig.store.write_count(), 1);
    let stored: Vec<i64> = rig
        .store
        .snapshot()
        .unwrap()
        .values()
        .map(|record| record.value)
        .collect();
    assert_eq!(stored.iter().filter(|value| **value == 10).count(), 1);
}

#[test]
fn marks_of_different_beads_are_independent() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.click(10);
    rig.click(11);
    rig.wait_view(|view| view.model.done_count == 3);
    rig.settle(DEBOUNCE * 5);

    assert_eq!(rig.store.write_count(), 2);
    assert_eq!(rig.last_view().model.done_count, 3);
    assert_eq!(
        rig.last_view().model.selected.as_ref().map(|item| item.id),
        Some(id(11))
    );
}

#[test]
fn marking_a_done_bead_is_reported() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.click(0);
    let notice = rig.wait_notice(|n| matches!(n, Notice::AlreadyDone { .. }));
    assert_eq!(notice, Notice::AlreadyDone { id: id(0) });
    rig.settle(DEBOUNCE * 3);
    assert_eq!(rig.store.write_count(), 0);
}

#[test]
fn failed_write_keeps_optimistic_mark() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();
    rig.store.set_fail_writes(true);

    rig.click(12);
    let notice = rig.wait_notice(|n| matches!(n, Notice::PersistFailed { .. }));
    let Notice::PersistFailed { id: failed, message } = notice else {
        unreachable!();
    };
    assert_eq!(failed, id(12));
    assert!(message.contains("rejected"), "{message}");
    assert!(bead_disabled(rig.last_view(), 12));
    assert_eq!(rig.store.write_count(), 0);
}

#[test]
fn subscription_errors_surface_as_notices() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.store
        .publish_error(StoreError::Transport {
            reason: "offline".into(),
        })
        .unwrap();
    let notice = rig.wait_notice(|n| matches!(n, Notice::SubscriptionError { .. }));
    assert!(matches!(notice, Notice::SubscriptionError { message } if message.contains("offline")));

    // The subscription stays usable.
    rig.click(1);
    rig.wait_view(|view| view.model.done_count == 2);
}

#[test]
fn malformed_entries_are_skipped_and_reported() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.store
        .publish_raw(json!({
            "a": { "value": 0 },
            "b": { "value": 4 },
            "c": { "value": "not a bead" },
        }))
        .unwrap();
    let notice = rig.wait_notice(|n| matches!(n, Notice::MalformedEntries { .. }));
    assert_eq!(notice, Notice::MalformedEntries { rejected: 1 });
    let view = rig.wait_view(|view| view.model.done_count == 2);
    assert!(bead_disabled(&view, 4));
}

#[test]
fn close_cancels_pending_writes() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.click(20);
    rig.close();
    std::thread::sleep(DEBOUNCE * 4);

    assert_eq!(rig.store.write_count(), 0);
    assert_eq!(rig.store.subscriber_count(), 0);
}

/// Memory store whose writes take `delay`.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
    writing: AtomicBool,
}

impl RealtimeStore for SlowStore {
    fn append(&self, id: BeadId) -> Result<(), StoreError> {
        self.writing.store(true, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.inner.append(id)
    }

    fn subscribe(&self) -> Result<StoreSubscription, StoreError> {
        self.inner.subscribe()
    }
}

#[test]
fn close_waits_for_in_flight_write() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::with_done([id(0)]),
        delay: Duration::from_millis(300),
        writing: AtomicBool::new(false),
    });
    let handle = spawn_session(
        store.clone(),
        Arc::new(LocalPageFetcher),
        SessionConfig { debounce: DEBOUNCE },
    )
    .unwrap();
    while let Ok(event) = handle.events().recv_timeout(Duration::from_secs(5)) {
        if matches!(event, SessionEvent::Render(ref view) if view.ready) {
            break;
        }
    }

    handle.send(Command::Click(id(20))).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !store.writing.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "write never started");
        std::thread::sleep(Duration::from_millis(5));
    }

    handle.close();
    assert_eq!(store.inner.write_count(), 1);
}

#[test]
fn load_more_appends_and_prepends_pages() {
    let mut rig = SessionRig::start(MemoryStore::with_done(ids(0..200)));
    let view = rig.wait_ready();
    assert_eq!(first_bead(&view), Some(200));
    assert!(view.previous.enabled);

    rig.send(Command::FetchNext);
    let view = rig.wait_view(|view| view.model.pages.len() == 2);
    assert_eq!(view.model.pages[1].beads[0].id.get(), 308);

    rig.send(Command::FetchPrevious);
    let view = rig.wait_view(|view| view.model.pages.len() == 3);
    assert_eq!(first_bead(&view), Some(92));
    // Page at 92 still points back to 0.
    assert!(view.previous.enabled);
}

#[test]
fn sentinel_entering_view_loads_next_page() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.wait_ready();

    rig.send(Command::SentinelVisibility(true));
    let view = rig.wait_view(|view| view.model.pages.len() == 2);
    assert_eq!(view.model.pages[1].beads[0].id.get(), 109);
}

#[test]
fn sentinel_in_view_before_ready_loads_next_page() {
    let mut rig = SessionRig::start(MemoryStore::with_done([id(0)]));
    rig.send(Command::SentinelVisibility(true));

    let view = rig.wait_view(|view| view.model.pages.len() == 2);
    assert_eq!(view.model.pages[1].beads[0].id.get(), 109);
}

/// Fails the first `failures` fetches, then serves local pages.
struct FlakyFetcher {
    failures: usize,
    calls: AtomicUsize,
}

impl PageFetcher for FlakyFetcher {
    fn fetch_page(&self, cursor: Cursor) -> Result<Page, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(FetchError::Status { code: 503 });
        }
        LocalPageFetcher.fetch_page(cursor)
    }
}

#[test]
fn failed_initial_fetch_is_retried_by_navigation() {
    let fetcher = Arc::new(FlakyFetcher {
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let mut rig = SessionRig::start_with(MemoryStore::with_done([id(0)]), fetcher.clone());

    let notice = rig.wait_notice(|n| matches!(n, Notice::FetchFailed { .. }));
    assert!(matches!(notice, Notice::FetchFailed { cursor, .. } if cursor == Cursor(1)));
    rig.wait_view(|view| matches!(view.status, QueryStatus::Error(_)));

    rig.send(Command::FetchNext);
    let view = rig.wait_ready();
    assert_eq!(first_bead(&view), Some(1));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

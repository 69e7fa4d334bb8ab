#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use japa::BeadId;
use japa::client::{
    Command, LocalPageFetcher, Notice, PageFetcher, SessionConfig, SessionEvent, SessionHandle,
    SessionView, spawn_session,
};
use japa::store::MemoryStore;

pub const DEBOUNCE: Duration = Duration::from_millis(40);
const WAIT: Duration = Duration::from_secs(5);

pub fn id(raw: i64) -> BeadId {
    BeadId::new(raw).expect("valid bead id")
}

pub fn ids(range: std::ops::Range<i64>) -> Vec<BeadId> {
    range.map(id).collect()
}

/// Running session over a memory store, with every event it emitted so far.
pub struct SessionRig {
    pub store: MemoryStore,
    handle: Option<SessionHandle>,
    pub views: Vec<SessionView>,
    pub notices: Vec<Notice>,
}

impl SessionRig {
    pub fn start(store: MemoryStore) -> Self {
        Self::start_with(store, Arc::new(LocalPageFetcher))
    }

    pub fn start_with(store: MemoryStore, fetcher: Arc<dyn PageFetcher>) -> Self {
        let handle = spawn_session(
            Arc::new(store.clone()),
            fetcher,
            SessionConfig { debounce: DEBOUNCE },
        )
        .expect("spawn session");
        Self {
            store,
            handle: Some(handle),
            views: Vec::new(),
            notices: Vec::new(),
        }
    }

    fn handle(&self) -> &SessionHandle {
        self.handle.as_ref().expect("session open")
    }

    pub fn send(&self, command: Command) {
        self.handle().send(command).expect("send command");
    }

    pub fn click(&self, raw: i64) {
        self.send(Command::Click(id(raw)));
    }

    /// Block until a render satisfies `pred`.
    pub fn wait_view(&mut self, pred: impl Fn(&SessionView) -> bool) -> SessionView {
        if let Some(view) = self.views.last()
            && pred(view)
        {
            return view.clone();
        }
        let deadline = Instant::now() + WAIT;
        loop {
            match self.next_event(deadline) {
                Some(SessionEvent::Render(view)) if pred(&view) => return view,
                Some(_) => {}
                None => panic!("timed out waiting for view; last: {:?}", self.views.last()),
            }
        }
    }

    pub fn wait_ready(&mut self) -> SessionView {
        self.wait_view(|view| view.ready && !view.model.pages.is_empty())
    }

    pub fn wait_notice(&mut self, pred: impl Fn(&Notice) -> bool) -> Notice {
        if let Some(notice) = self.notices.iter().find(|n| pred(n)) {
            return notice.clone();
        }
        let deadline = Instant::now() + WAIT;
        loop {
            match self.next_event(deadline) {
                Some(SessionEvent::Notice(notice)) if pred(&notice) => return notice,
                Some(_) => {}
                None => panic!("timed out waiting for notice; seen: {:?}", self.notices),
            }
        }
    }

    /// Collect events for `window`.
    pub fn settle(&mut self, window: Duration) {
        let deadline = Instant::now() + window;
        while self.next_event(deadline).is_some() {}
    }

    pub fn last_view(&self) -> &SessionView {
        self.views.last().expect("at least one render")
    }

    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }

    fn next_event(&mut self, deadline: Instant) -> Option<SessionEvent> {
        let event = self.handle().events().recv_deadline(deadline).ok()?;
        match &event {
            SessionEvent::Render(view) => self.views.push(view.clone()),
            SessionEvent::Notice(notice) => self.notices.push(notice.clone()),
        }
        Some(event)
    }
}

impl Drop for SessionRig {
    fn drop(&mut self) {
        self.close();
    }
}

//! Infinite-scroll pagination state.
//!
//! Pages are loaded in both directions from an initial cursor and kept for
//! the life of the driver. Next/previous requests are debounced per
//! direction; the owner performs fetches and reports completions back.

use std::time::Duration;

use crossbeam::channel::Sender;
use serde::Serialize;

use super::fetcher::FetchError;
use super::scheduler::{Debouncer, TimerFired};
use crate::core::{Cursor, Page};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

pub type PaginationTimer = TimerFired<Direction>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Initial,
    Next,
    Previous,
}

impl From<Direction> for FetchKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Next => FetchKind::Next,
            Direction::Previous => FetchKind::Previous,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: FetchKind,
    pub cursor: Cursor,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum QueryStatus {
    Pending,
    Success,
    Error(String),
}

/// Enabled state and caption of a load-more control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub enabled: bool,
    pub label: &'static str,
}

pub struct PaginationDriver {
    pages: Vec<Page>,
    initial: Option<Cursor>,
    status: QueryStatus,
    fetching_initial: bool,
    fetching_next: bool,
    fetching_previous: bool,
    sentinel_visible: bool,
    sentinel_fired: bool,
    debouncer: Debouncer<Direction, ()>,
}

impl PaginationDriver {
    pub fn new(timer_tx: Sender<PaginationTimer>, delay: Duration) -> Self {
        Self {
            pages: Vec::new(),
            initial: None,
            status: QueryStatus::Pending,
            fetching_initial: false,
            fetching_next: false,
            fetching_previous: false,
            sentinel_visible: false,
            sentinel_fired: false,
            debouncer: Debouncer::new(timer_tx, delay),
        }
    }

    /// Issue the initial fetch. Only the first call has an effect.
    pub fn start(&mut self, cursor: Cursor) -> Option<FetchRequest> {
        if self.initial.is_some() {
            return None;
        }
        self.initial = Some(cursor);
        Some(self.begin_initial(cursor))
    }

    pub fn is_started(&self) -> bool {
        self.initial.is_some()
    }

    /// Debounced request for the page after the last loaded one.
    pub fn fetch_next(&mut self) -> bool {
        self.request(Direction::Next)
    }

    /// Debounced request for the page before the first loaded one.
    pub fn fetch_previous(&mut self) -> bool {
        self.request(Direction::Previous)
    }

    /// Sentinel visibility report; a transition into view requests the next
    /// page. Returns true if a request was scheduled.
    ///
    /// A transition seen before the driver starts is held until the first
    /// page lands.
    pub fn on_sentinel_visibility(&mut self, visible: bool) -> bool {
        self.sentinel_visible = visible;
        if !visible {
            self.sentinel_fired = false;
            return false;
        }
        self.fire_sentinel()
    }

    fn fire_sentinel(&mut self) -> bool {
        if self.sentinel_fired {
            return false;
        }
        self.sentinel_fired = self.fetch_next();
        self.sentinel_fired
    }

    /// Resolve a debounced request into a fetch, if one is due.
    pub fn on_timer(&mut self, fired: PaginationTimer) -> Option<FetchRequest> {
        let direction = fired.key;
        self.debouncer.fire(fired)?;
        self.resolve(direction)
    }

    /// Record a finished fetch. Returns true (observable state always changes).
    pub fn on_fetch_complete(
        &mut self,
        request: FetchRequest,
        result: Result<Page, FetchError>,
    ) -> bool {
        match request.kind {
            FetchKind::Initial => self.fetching_initial = false,
            FetchKind::Next => self.fetching_next = false,
            FetchKind::Previous => self.fetching_previous = false,
        }

        let mut page = match result {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(cursor = %request.cursor, kind = ?request.kind, "page fetch failed: {err}");
                self.status = QueryStatus::Error(err.to_string());
                return true;
            }
        };

        self.status = QueryStatus::Success;
        if self.is_loaded(page.cursor()) {
            return true;
        }
        match request.kind {
            FetchKind::Initial => {
                self.pages.clear();
                self.pages.push(page);
                if self.sentinel_visible {
                    self.fire_sentinel();
                }
            }
            FetchKind::Next => self.pages.push(page),
            FetchKind::Previous => {
                if let Some(bound) = self.pages.first().and_then(Page::first_id) {
                    page.truncate_before(bound);
                }
                self.pages.insert(0, page);
            }
        }
        tracing::debug!(cursor = %request.cursor, pages = self.pages.len(), "page loaded");
        true
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn status(&self) -> &QueryStatus {
        &self.status
    }

    pub fn has_next(&self) -> bool {
        self.next_cursor().is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_cursor().is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching_initial || self.fetching_next || self.fetching_previous
    }

    pub fn is_fetching_next(&self) -> bool {
        self.fetching_next
    }

    pub fn is_fetching_previous(&self) -> bool {
        self.fetching_previous
    }

    /// Fetching, but not for the bottom of the list.
    pub fn is_background_fetching(&self) -> bool {
        self.is_fetching() && !self.fetching_next
    }

    pub fn next_control(&self) -> ControlState {
        control(self.has_next(), self.fetching_next, "Load Newer")
    }

    pub fn previous_control(&self) -> ControlState {
        control(self.has_previous(), self.fetching_previous, "Load Older")
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel_all();
    }

    fn request(&mut self, direction: Direction) -> bool {
        if !self.is_started() {
            return false;
        }
        self.debouncer.schedule(direction, ());
        true
    }

    fn resolve(&mut self, direction: Direction) -> Option<FetchRequest> {
        if self.pages.is_empty() {
            // Nothing loaded: navigation retries a failed initial fetch.
            let failed = matches!(self.status, QueryStatus::Error(_));
            return match self.initial {
                Some(cursor) if failed && !self.fetching_initial => {
                    Some(self.begin_initial(cursor))
                }
                _ => None,
            };
        }

        let (cursor, in_flight) = match direction {
            Direction::Next => (self.next_cursor(), self.fetching_next),
            Direction::Previous => (self.previous_cursor(), self.fetching_previous),
        };
        let cursor = cursor?;
        if in_flight || self.is_loaded(cursor) {
            return None;
        }
        match direction {
            Direction::Next => self.fetching_next = true,
            Direction::Previous => self.fetching_previous = true,
        }
        Some(FetchRequest {
            kind: direction.into(),
            cursor,
        })
    }

    fn begin_initial(&mut self, cursor: Cursor) -> FetchRequest {
        self.fetching_initial = true;
        if self.pages.is_empty() {
            self.status = QueryStatus::Pending;
        }
        FetchRequest {
            kind: FetchKind::Initial,
            cursor,
        }
    }

    fn next_cursor(&self) -> Option<Cursor> {
        self.pages.last().and_then(Page::next_cursor)
    }

    fn previous_cursor(&self) -> Option<Cursor> {
        self.pages.first().and_then(Page::previous_cursor)
    }

    fn is_loaded(&self, cursor: Cursor) -> bool {
        self.pages.iter().any(|page| page.cursor() == cursor)
    }
}

fn control(available: bool, fetching: bool, label: &'static str) -> ControlState {
    ControlState {
        enabled: available && !fetching,
        label: if fetching {
            "Loading more..."
        } else if available {
            label
        } else {
            "Nothing more to load"
        },
    }
}

//! Core domain types for the counter.
//!
//! Module hierarchy follows type dependency order:
//! - error: CoreError
//! - bead: BeadId and the compiled-in dimensions
//! - done_set: DoneSet
//! - page: Cursor, PageItem, Page

pub mod bead;
pub mod done_set;
pub mod error;
pub mod page;

pub use bead::{BeadId, MAX_BEAD, PAGE_SIZE, malas};
pub use done_set::DoneSet;
pub use error::{CoreError, InvalidBeadId, InvalidPage};
pub use page::{Cursor, Page, PageItem};

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod paths;
pub mod server;
pub mod store;
pub mod telemetry;

pub use error::{Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{BeadId, Cursor, DoneSet, MAX_BEAD, PAGE_SIZE, Page, PageItem, malas};

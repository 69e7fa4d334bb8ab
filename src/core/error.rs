//! Core capability errors (validation of ids and pages).
//!
//! These are bounded and stable: core errors represent domain/refusal states,
//! not library implementation details.

use thiserror::Error;

use crate::error::Transience;

/// Bead id outside the counter's range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("bead id {raw} is invalid: must be within 0..={max}")]
pub struct InvalidBeadId {
    pub raw: i64,
    pub max: u32,
}

/// Page that violates the pagination invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("page starting at cursor {cursor} is invalid: {reason}")]
pub struct InvalidPage {
    pub cursor: u32,
    pub reason: String,
}

/// Canonical error enum for core capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidBeadId(#[from] InvalidBeadId),
    #[error(transparent)]
    InvalidPage(#[from] InvalidPage),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure domain/input failures.
        Transience::Permanent
    }
}

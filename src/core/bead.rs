//! Bead identity and the counter's compiled-in dimensions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, InvalidBeadId};

/// Beads per page, and beads per mala.
pub const PAGE_SIZE: u32 = 108;

/// Highest bead id the counter knows about.
pub const MAX_BEAD: u32 = 1404;

/// One numbered unit of work, `0..=MAX_BEAD`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct BeadId(u32);

impl BeadId {
    pub fn new(raw: i64) -> Result<Self, CoreError> {
        if (0..=i64::from(MAX_BEAD)).contains(&raw) {
            Ok(Self(raw as u32))
        } else {
            Err(InvalidBeadId { raw, max: MAX_BEAD }.into())
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Every 108th bead closes a mala.
    pub fn is_milestone(self) -> bool {
        self.0 % PAGE_SIZE == 0
    }

    /// Index of the page this bead falls on when pages are aligned to 0.
    pub fn page_number(self) -> u32 {
        self.0 / PAGE_SIZE
    }
}

impl TryFrom<i64> for BeadId {
    type Error = CoreError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<BeadId> for u32 {
    fn from(id: BeadId) -> Self {
        id.0
    }
}

impl fmt::Debug for BeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeadId({})", self.0)
    }
}

impl fmt::Display for BeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completed malas for a number of completed beads.
pub fn malas(done: usize) -> usize {
    done / PAGE_SIZE as usize
}

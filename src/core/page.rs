//! Cursor-addressed pages of beads.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bead::{BeadId, PAGE_SIZE};
use super::error::{CoreError, InvalidPage};

/// Pagination position: the id of the first item a page starts at.
///
/// Unlike [`BeadId`] a cursor may point past the last bead, in which case
/// the page at that cursor is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub u32);

impl Cursor {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Resume point for a done set of `len` beads.
    pub fn resume_from(len: usize) -> Self {
        Cursor(u32::try_from(len).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageItem {
    pub id: BeadId,
    pub name: String,
}

/// One fetched page, validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    cursor: Cursor,
    items: Vec<PageItem>,
    next_cursor: Option<Cursor>,
    previous_cursor: Option<Cursor>,
}

impl Page {
    /// Build a page fetched at `cursor`, checking that items are contiguous,
    /// ascending, at most one page long and that `next_cursor` moves forward.
    pub fn new(
        cursor: Cursor,
        items: Vec<PageItem>,
        next_cursor: Option<Cursor>,
        previous_cursor: Option<Cursor>,
    ) -> Result<Self, CoreError> {
        let invalid = |reason: String| -> CoreError {
            InvalidPage {
                cursor: cursor.get(),
                reason,
            }
            .into()
        };

        if items.len() > PAGE_SIZE as usize {
            return Err(invalid(format!(
                "{} items exceeds page size {PAGE_SIZE}",
                items.len()
            )));
        }
        for pair in items.windows(2) {
            if pair[1].id.get() != pair[0].id.get() + 1 {
                return Err(invalid(format!(
                    "ids {} and {} are not contiguous",
                    pair[0].id, pair[1].id
                )));
            }
        }
        if let (Some(first), Some(next)) = (items.first(), next_cursor)
            && next.get() <= first.id.get()
        {
            return Err(invalid(format!(
                "next cursor {next} does not advance past first id {}",
                first.id
            )));
        }

        Ok(Self {
            cursor,
            items,
            next_cursor,
            previous_cursor,
        })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn items(&self) -> &[PageItem] {
        &self.items
    }

    pub fn next_cursor(&self) -> Option<Cursor> {
        self.next_cursor
    }

    pub fn previous_cursor(&self) -> Option<Cursor> {
        self.previous_cursor
    }

    pub fn first_id(&self) -> Option<BeadId> {
        self.items.first().map(|item| item.id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop items at or beyond `bound`. Used when a page fetched backwards
    /// overlaps the page that follows it.
    pub fn truncate_before(&mut self, bound: BeadId) {
        self.items.retain(|item| item.id < bound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(range: std::ops::Range<i64>) -> Vec<PageItem> {
        range
            .map(|id| PageItem {
                id: BeadId::new(id).unwrap(),
                name: format!("Project {id}"),
            })
            .collect()
    }

    #[test]
    fn accepts_contiguous_page() {
        let page = Page::new(Cursor(0), items(0..108), Some(Cursor(108)), None).unwrap();
        assert_eq!(page.items().len(), 108);
        assert_eq!(page.first_id().map(BeadId::get), Some(0));
    }

    #[test]
    fn rejects_oversized_page() {
        let err = Page::new(Cursor(0), items(0..109), Some(Cursor(109)), None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPage(_)));
    }

    #[test]
    fn rejects_gaps() {
        let mut gapped = items(0..3);
        gapped.extend(items(4..6));
        assert!(Page::new(Cursor(0), gapped, Some(Cursor(6)), None).is_err());
    }

    #[test]
    fn rejects_non_advancing_next_cursor() {
        assert!(Page::new(Cursor(10), items(10..20), Some(Cursor(10)), None).is_err());
    }

    #[test]
    fn empty_page_is_valid() {
        let page = Page::new(Cursor(2000), Vec::new(), None, Some(Cursor(1892))).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.first_id(), None);
    }

    #[test]
    fn truncate_before_drops_overlap() {
        let mut page = Page::new(Cursor(0), items(0..108), Some(Cursor(108)), None).unwrap();
        page.truncate_before(BeadId::new(50).unwrap());
        assert_eq!(page.items().len(), 50);
        assert_eq!(page.items().last().map(|item| item.id.get()), Some(49));
    }
}

//! The set of completed bead ids.

use std::collections::BTreeSet;

use super::bead::{BeadId, malas};

/// Completed bead ids as last observed from the realtime store, plus any
/// optimistic local marks made since.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DoneSet {
    ids: BTreeSet<BeadId>,
}

impl DoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: BeadId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns true if the id was not already present.
    pub fn insert(&mut self, id: BeadId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn malas(&self) -> usize {
        malas(self.ids.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = BeadId> + '_ {
        self.ids.iter().copied()
    }

    /// Size-then-membership comparison, cheap when sizes differ.
    pub fn same_members(&self, other: &DoneSet) -> bool {
        self.ids.len() == other.ids.len() && other.ids.iter().all(|id| self.ids.contains(id))
    }
}

impl FromIterator<BeadId> for DoneSet {
    fn from_iter<I: IntoIterator<Item = BeadId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[i64]) -> DoneSet {
        ids.iter().map(|raw| BeadId::new(*raw).unwrap()).collect()
    }

    #[test]
    fn duplicate_ids_collapse() {
        let done = set(&[3, 3, 3]);
        assert_eq!(done.len(), 1);
        assert!(done.contains(BeadId::new(3).unwrap()));
    }

    #[test]
    fn same_members_compares_size_and_membership() {
        assert!(set(&[1, 2]).same_members(&set(&[2, 1])));
        assert!(!set(&[1, 2]).same_members(&set(&[1])));
        assert!(!set(&[1, 2]).same_members(&set(&[1, 3])));
        assert!(DoneSet::new().same_members(&DoneSet::new()));
    }
}

//! BTreeMap-based index structures
//!
//! An index maps each index key to the sorted set of primary keys carrying it.
//! Iteration order is (index key, primary key), both ascending.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use super::key::IndexKey;
use super::range::{Direction, KeyRange};

/// Finds the first entry of `map` inside `range` that lies strictly past `after`
/// in the given direction.
pub fn seek<'m, V>(
    map: &'m BTreeMap<IndexKey, V>,
    range: &KeyRange,
    after: Option<&IndexKey>,
    direction: Direction,
) -> Option<(&'m IndexKey, &'m V)> {
    let narrowed;
    let range = match after {
        Some(key) => {
            narrowed = range.after(key, direction);
            &narrowed
        }
        None => range,
    };

    // BTreeMap::range panics on inverted bounds
    if range.is_empty() {
        return None;
    }

    let mut entries = map.range::<IndexKey, _>(range.as_bounds());
    match direction {
        Direction::Forward => entries.next(),
        Direction::Reverse => entries.next_back(),
    }
}

/// A secondary index over one store.
#[derive(Debug, Clone, Default)]
pub struct IndexTree {
    /// Index key -> primary keys
    tree: BTreeMap<IndexKey, BTreeSet<IndexKey>>,
}

impl IndexTree {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert a primary key under an index key.
    pub fn insert(&mut self, key: IndexKey, primary: IndexKey) {
        self.tree.entry(key).or_default().insert(primary);
    }

    /// Remove a primary key from an index key.
    ///
    /// If the key has no more primary keys, removes the key entirely.
    pub fn remove(&mut self, key: &IndexKey, primary: &IndexKey) {
        if let Some(primaries) = self.tree.get_mut(key) {
            primaries.remove(primary);
            if primaries.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Returns true if `key` is held by any record other than `primary`.
    pub fn is_taken_by_other(&self, key: &IndexKey, primary: &IndexKey) -> bool {
        self.tree
            .get(key)
            .map_or(false, |primaries| primaries.iter().any(|p| p != primary))
    }

    /// Returns the next (index key, primary key) entry inside `range`, strictly
    /// past the `after` position in the given direction.
    pub fn next_entry(
        &self,
        range: &KeyRange,
        after: Option<(&IndexKey, &IndexKey)>,
        direction: Direction,
    ) -> Option<(IndexKey, IndexKey)> {
        if let Some((key, primary)) = after {
            // Remaining duplicates under the current index key come first
            if range.contains(key) {
                if let Some(primaries) = self.tree.get(key) {
                    let next = match direction {
                        Direction::Forward => primaries
                            .range::<IndexKey, _>((Bound::Excluded(primary), Bound::Unbounded))
                            .next(),
                        Direction::Reverse => primaries
                            .range::<IndexKey, _>((Bound::Unbounded, Bound::Excluded(primary)))
                            .next_back(),
                    };
                    if let Some(next) = next {
                        return Some((key.clone(), next.clone()));
                    }
                }
            }
        }

        let (key, primaries) = seek(&self.tree, range, after.map(|(k, _)| k), direction)?;
        let primary = match direction {
            Direction::Forward => primaries.first(),
            Direction::Reverse => primaries.last(),
        }?;
        Some((key.clone(), primary.clone()))
    }
}

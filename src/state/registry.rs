//! Surrogate key assignment for dimension values

use indexmap::IndexSet;
use std::hash::Hash;

/// Surrogate key of a dimension row
pub type DimensionId = u64;

/// Assigns stable surrogate ids to distinct dimension values
///
/// Ids start at 1 and follow first-seen order. A value keeps its id for the
/// lifetime of the registry and ids are never reused.
#[derive(Debug, Clone)]
pub struct DimensionRegistry<K> {
    entries: IndexSet<K>,
}

impl<K: Hash + Eq> DimensionRegistry<K> {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            entries: IndexSet::new(),
        }
    }

    /// Returns the id of `key`, assigning the next one if it is new
    pub fn intern(&mut self, key: K) -> DimensionId {
        let (index, _) = self.entries.insert_full(key);
        to_id(index)
    }

    /// Looks up the id of an already interned value
    pub fn get(&self, key: &K) -> Option<DimensionId> {
        self.entries.get_index_of(key).map(to_id)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been interned
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(id, value)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (DimensionId, &K)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, key)| (to_id(index), key))
    }
}

impl<K: Hash + Eq> Default for DimensionRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn to_id(index: usize) -> DimensionId {
    index as DimensionId + 1
}

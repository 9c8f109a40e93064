//! Normalized, canonically ordered metadata snapshots.
//!
//! # Responsibility
//! - Hold one entity's revisionable metadata at a point in time.
//! - Compare two snapshots key by key.
//!
//! # Invariants
//! - Excluded keys never appear in a snapshot.
//! - Keys iterate in lexicographic order regardless of storage order.
//! - Snapshots are built per call and never cached.

use crate::model::meta_value::SnapshotValue;
use std::collections::btree_map;
use std::collections::BTreeMap;

pub mod builder;
pub mod diff;

/// Metadata key -> normalized value, sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<String, SnapshotValue>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.entries.get(key)
    }

    /// Returns whether `key` survived filtering.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in lexicographic key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, SnapshotValue> {
        self.entries.iter()
    }

    /// Number of revisionable keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty snapshot means "no revisionable metadata".
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, key: String, value: SnapshotValue) {
        self.entries.insert(key, value);
    }
}

impl FromIterator<(String, SnapshotValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, SnapshotValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a SnapshotValue);
    type IntoIter = btree_map::Iter<'a, String, SnapshotValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

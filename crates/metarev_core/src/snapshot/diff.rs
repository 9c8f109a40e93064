//! Field-level comparison of two snapshots.

use crate::model::meta_value::SnapshotValue;
use crate::snapshot::Snapshot;
use std::collections::BTreeSet;

/// One key that differs between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaChange {
    Added {
        key: String,
        value: SnapshotValue,
    },
    Removed {
        key: String,
        value: SnapshotValue,
    },
    /// Same key, different normalized value (including scalar vs sequence).
    Modified {
        key: String,
        from: SnapshotValue,
        to: SnapshotValue,
    },
}

impl MetaChange {
    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Removed { key, .. } | Self::Modified { key, .. } => {
                key
            }
        }
    }
}

/// Ordered list of key-level changes from one snapshot to another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    changes: Vec<MetaChange>,
}

impl SnapshotDiff {
    /// Computes the changes that turn `from` into `to`, sorted by key.
    pub fn between(from: &Snapshot, to: &Snapshot) -> Self {
        let keys: BTreeSet<&str> = from.keys().chain(to.keys()).collect();
        let changes = keys
            .into_iter()
            .filter_map(|key| match (from.get(key), to.get(key)) {
                (None, Some(value)) => Some(MetaChange::Added {
                    key: key.to_string(),
                    value: value.clone(),
                }),
                (Some(value), None) => Some(MetaChange::Removed {
                    key: key.to_string(),
                    value: value.clone(),
                }),
                (Some(old), Some(new)) if old != new => Some(MetaChange::Modified {
                    key: key.to_string(),
                    from: old.clone(),
                    to: new.clone(),
                }),
                _ => None,
            })
            .collect();

        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[MetaChange] {
        &self.changes
    }

    pub fn changed_keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(MetaChange::key)
    }
}

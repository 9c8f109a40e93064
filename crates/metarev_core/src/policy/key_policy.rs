//! Exclusion set of metadata keys that never take part in revisioning.
//!
//! # Invariants
//! - The effective set is fixed once `KeyPolicy` is constructed.
//! - The construction hook runs exactly once and is not validated.

use std::collections::BTreeSet;

/// Keys the host uses for edit locks and last-editor tracking.
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &["_edit_lock", "_edit_last"];

/// Read-only exclusion policy consulted by every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPolicy {
    excluded: BTreeSet<String>,
}

impl KeyPolicy {
    /// Policy with the default exclusion set.
    pub fn new() -> Self {
        Self::with_hook(|defaults| defaults)
    }

    /// Builds the policy by passing the defaults through `hook`.
    ///
    /// The hook may add or remove keys, or return an empty set.
    pub fn with_hook<F>(hook: F) -> Self
    where
        F: FnOnce(BTreeSet<String>) -> BTreeSet<String>,
    {
        Self {
            excluded: hook(default_exclusion_set()),
        }
    }

    pub fn exclusion_set(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded.contains(key)
    }
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self::new()
    }
}

fn default_exclusion_set() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_KEYS
        .iter()
        .map(|key| (*key).to_string())
        .collect()
}

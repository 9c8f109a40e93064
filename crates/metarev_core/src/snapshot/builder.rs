//! Snapshot construction from raw storage rows.

use crate::model::entity::MetadataAddressable;
use crate::model::meta_value::SnapshotValue;
use crate::policy::key_policy::KeyPolicy;
use crate::repo::meta_repo::MetadataStore;
use crate::repo::RepoResult;
use crate::snapshot::Snapshot;
use log::{debug, error};

/// Builds snapshots of any metadata owner under one key policy.
pub struct SnapshotBuilder<'a, S: MetadataStore + ?Sized> {
    policy: &'a KeyPolicy,
    store: &'a S,
}

impl<'a, S: MetadataStore + ?Sized> SnapshotBuilder<'a, S> {
    pub fn new(policy: &'a KeyPolicy, store: &'a S) -> Self {
        Self { policy, store }
    }

    pub fn policy(&self) -> &'a KeyPolicy {
        self.policy
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Snapshots the current metadata of `entity`.
    ///
    /// # Errors
    /// Storage failures propagate unchanged; they are never reported as an
    /// empty snapshot.
    pub fn build(&self, entity: &impl MetadataAddressable) -> RepoResult<Snapshot> {
        let entity_id = entity.metadata_id();
        let raw = entity.get_all_metadata(self.store).map_err(|err| {
            error!(
                "event=snapshot_build module=snapshot status=error entity={entity_id} error={err}"
            );
            err
        })?;

        let total_keys = raw.len();
        let mut snapshot = Snapshot::new();
        for (key, values) in raw {
            if self.policy.is_excluded(&key) {
                continue;
            }
            let value = SnapshotValue::from_raw_values(&values);
            snapshot.insert(key, value);
        }

        debug!(
            "event=snapshot_build module=snapshot status=ok entity={entity_id} keys={} excluded={}",
            snapshot.len(),
            total_keys - snapshot.len()
        );
        Ok(snapshot)
    }
}

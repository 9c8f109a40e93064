//! Snapshot persistence onto revisions, restore onto documents, and the
//! revision-aware metadata read path.
//!
//! # Responsibility
//! - Copy a document's filtered metadata onto a freshly created revision.
//! - Copy a revision's metadata back onto the live document on restore.
//! - Substitute stored rows for generic metadata reads on editor/revision screens.
//!
//! # Invariants
//! - One write per key; replaying either copy yields the same end state.
//! - Restore only overwrites keys present in the revision snapshot.
//! - A found row wins even when its value is empty.

use crate::context::RequestContext;
use crate::model::entity::{EntityId, EntityRef};
use crate::policy::key_policy::KeyPolicy;
use crate::repo::meta_repo::{MetadataStore, RevisionLookup};
use crate::service::{RevisionError, RevisionResult};
use crate::snapshot::builder::SnapshotBuilder;
use crate::snapshot::Snapshot;
use log::{error, info};

/// Value produced by a generic metadata read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaRead {
    /// Single-value read; `None` when nothing is stored.
    Single(Option<String>),
    /// All-values read.
    Many(Vec<String>),
}

/// Outcome of the read-path interception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaLookup {
    /// A stored row was found and replaces the default read.
    Found(MetaRead),
    /// Defer to the host's normal read path.
    PassThrough,
}

/// Moves snapshots between documents and revisions.
pub struct SnapshotSync<'a, S: MetadataStore + ?Sized, L: RevisionLookup + ?Sized> {
    snapshots: SnapshotBuilder<'a, S>,
    lookup: &'a L,
}

impl<'a, S, L> SnapshotSync<'a, S, L>
where
    S: MetadataStore + ?Sized,
    L: RevisionLookup + ?Sized,
{
    pub fn new(policy: &'a KeyPolicy, store: &'a S, lookup: &'a L) -> Self {
        Self {
            snapshots: SnapshotBuilder::new(policy, store),
            lookup,
        }
    }

    /// Captures the parent document's metadata onto `revision_id`.
    ///
    /// Returns the number of keys written.
    ///
    /// # Errors
    /// - `RevisionNotFound` when `revision_id` has no parent document.
    /// - `StorageUnavailable` on store failure; keys written so far stay written.
    pub fn on_revision_created(&self, revision_id: EntityId) -> RevisionResult<usize> {
        let parent_id = self
            .lookup
            .revision_parent(revision_id)?
            .ok_or(RevisionError::RevisionNotFound(revision_id))?;

        let snapshot = self.snapshots.build(&EntityRef::Document(parent_id))?;
        if snapshot.is_empty() {
            info!(
                "event=revision_meta_capture module=service status=skip revision={revision_id} reason=empty_snapshot"
            );
            return Ok(0);
        }

        let written = self.write_snapshot(revision_id, &snapshot, "revision_meta_capture")?;
        info!(
            "event=revision_meta_capture module=service status=ok revision={revision_id} document={parent_id} keys={written}"
        );
        Ok(written)
    }

    /// Writes the metadata stored on `revision_id` back onto `document_id`.
    ///
    /// Keys missing from the revision snapshot are left untouched. Returns the
    /// number of keys written.
    pub fn on_revision_restored(
        &self,
        document_id: EntityId,
        revision_id: EntityId,
    ) -> RevisionResult<usize> {
        let snapshot = self.snapshots.build(&EntityRef::Revision(revision_id))?;
        let written = self.write_snapshot(document_id, &snapshot, "revision_meta_restore")?;
        info!(
            "event=revision_meta_restore module=service status=ok document={document_id} revision={revision_id} keys={written}"
        );
        Ok(written)
    }

    /// Looks up `(entity_id, key)` directly in storage while editing or
    /// viewing a revision.
    pub fn read_metadata(
        &self,
        ctx: &RequestContext,
        entity_id: EntityId,
        key: &str,
        single: bool,
    ) -> RevisionResult<MetaLookup> {
        if !ctx.mode().is_active() {
            return Ok(MetaLookup::PassThrough);
        }

        let stored = self
            .snapshots
            .store()
            .get_single_metadata_value(entity_id, key)?;
        Ok(match stored {
            Some(value) if single => MetaLookup::Found(MetaRead::Single(Some(value))),
            Some(value) => MetaLookup::Found(MetaRead::Many(vec![value])),
            None => MetaLookup::PassThrough,
        })
    }

    /// Host read-path hook: a found stored row takes precedence over `default`.
    pub fn on_metadata_read(
        &self,
        default: MetaRead,
        ctx: &RequestContext,
        entity_id: EntityId,
        key: &str,
        single: bool,
    ) -> RevisionResult<MetaRead> {
        match self.read_metadata(ctx, entity_id, key, single)? {
            MetaLookup::Found(value) => Ok(value),
            MetaLookup::PassThrough => Ok(default),
        }
    }

    fn write_snapshot(
        &self,
        target_id: EntityId,
        snapshot: &Snapshot,
        event: &str,
    ) -> RevisionResult<usize> {
        let store = self.snapshots.store();
        let mut written = 0;
        for (key, value) in snapshot {
            if let Err(err) = store.replace_metadata(target_id, key, &value.encoded_values()) {
                error!(
                    "event={event} module=service status=error target={target_id} written={written} error={err}"
                );
                return Err(err.into());
            }
            written += 1;
        }
        Ok(written)
    }
}

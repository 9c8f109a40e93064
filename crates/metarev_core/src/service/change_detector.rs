//! Metadata change detection for the host's "should I revision" decision.
//!
//! # Invariants
//! - The result only ever upgrades the host verdict to "changed".
//! - Excluded keys never influence the result.

use crate::model::entity::{EntityId, EntityRef};
use crate::policy::key_policy::KeyPolicy;
use crate::repo::meta_repo::MetadataStore;
use crate::service::RevisionResult;
use crate::snapshot::builder::SnapshotBuilder;
use crate::snapshot::diff::SnapshotDiff;
use log::info;

/// Compares live document metadata with a stored revision.
pub struct ChangeDetector<'a, S: MetadataStore + ?Sized> {
    snapshots: SnapshotBuilder<'a, S>,
}

impl<'a, S: MetadataStore + ?Sized> ChangeDetector<'a, S> {
    pub fn new(policy: &'a KeyPolicy, store: &'a S) -> Self {
        Self {
            snapshots: SnapshotBuilder::new(policy, store),
        }
    }

    /// Key-level changes from the reference revision to the live document.
    pub fn diff(
        &self,
        document_id: EntityId,
        reference_revision_id: EntityId,
    ) -> RevisionResult<SnapshotDiff> {
        let current = self.snapshots.build(&EntityRef::Document(document_id))?;
        let reference = self
            .snapshots
            .build(&EntityRef::Revision(reference_revision_id))?;
        Ok(SnapshotDiff::between(&reference, &current))
    }

    /// Returns `true` when any non-excluded key was added, removed or changed.
    pub fn has_metadata_changed(
        &self,
        document_id: EntityId,
        reference_revision_id: EntityId,
    ) -> RevisionResult<bool> {
        let diff = self.diff(document_id, reference_revision_id)?;
        info!(
            "event=meta_change_check module=service status=ok document={document_id} revision={reference_revision_id} changed_keys={}",
            diff.changes().len()
        );
        Ok(!diff.is_empty())
    }

    /// ORs metadata change detection into the host's content verdict.
    ///
    /// Storage is not consulted when the host already decided "changed" or
    /// when there is no prior revision to compare against.
    pub fn on_content_changed_check(
        &self,
        current_changed: bool,
        prior_revision_id: Option<EntityId>,
        document_id: EntityId,
    ) -> RevisionResult<bool> {
        if current_changed {
            return Ok(true);
        }
        match prior_revision_id {
            Some(revision_id) => self.has_metadata_changed(document_id, revision_id),
            None => Ok(current_changed),
        }
    }
}

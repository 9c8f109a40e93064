//! Host-facing facade over the revisioning components.
//!
//! # Responsibility
//! - Own the key policy and storage collaborators for the process lifetime.
//! - Expose the callback contracts the host registers at startup.
//!
//! # Invariants
//! - The policy is fixed at construction.
//! - Request state arrives only through `RequestContext` parameters.

use crate::context::RequestContext;
use crate::model::entity::{EntityId, MetadataAddressable};
use crate::policy::key_policy::KeyPolicy;
use crate::repo::meta_repo::{MetadataStore, RevisionLookup};
use crate::service::change_detector::ChangeDetector;
use crate::service::field_presenter::{FieldPresenter, RevisionFieldSet};
use crate::service::snapshot_sync::{MetaRead, SnapshotSync};
use crate::service::RevisionResult;
use crate::snapshot::builder::SnapshotBuilder;
use crate::snapshot::Snapshot;

/// Metadata revisioning service wired to one store and revision lookup.
pub struct RevisionMetaService<S: MetadataStore, L: RevisionLookup> {
    policy: KeyPolicy,
    store: S,
    lookup: L,
}

impl<S: MetadataStore, L: RevisionLookup> RevisionMetaService<S, L> {
    pub fn new(policy: KeyPolicy, store: S, lookup: L) -> Self {
        Self {
            policy,
            store,
            lookup,
        }
    }

    pub fn policy(&self) -> &KeyPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshots(&self) -> SnapshotBuilder<'_, S> {
        SnapshotBuilder::new(&self.policy, &self.store)
    }

    pub fn change_detector(&self) -> ChangeDetector<'_, S> {
        ChangeDetector::new(&self.policy, &self.store)
    }

    pub fn field_presenter(&self) -> FieldPresenter<'_, S> {
        FieldPresenter::new(&self.policy, &self.store)
    }

    pub fn snapshot_sync(&self) -> SnapshotSync<'_, S, L> {
        SnapshotSync::new(&self.policy, &self.store, &self.lookup)
    }

    /// Fresh snapshot of `entity`'s revisionable metadata.
    pub fn build_snapshot(&self, entity: &impl MetadataAddressable) -> RevisionResult<Snapshot> {
        Ok(self.snapshots().build(entity)?)
    }

    /// Called while the host decides whether a new revision is warranted.
    pub fn on_content_changed_check(
        &self,
        current_changed: bool,
        prior_revision_id: Option<EntityId>,
        document_id: EntityId,
    ) -> RevisionResult<bool> {
        self.change_detector()
            .on_content_changed_check(current_changed, prior_revision_id, document_id)
    }

    /// Called while the host assembles the fields it diffs and displays.
    pub fn on_declare_revision_fields(
        &self,
        fields: RevisionFieldSet,
        ctx: &RequestContext,
    ) -> RevisionResult<RevisionFieldSet> {
        self.field_presenter().on_declare_revision_fields(fields, ctx)
    }

    /// Called right after the host persisted a new revision record.
    pub fn on_revision_created(&self, revision_id: EntityId) -> RevisionResult<usize> {
        self.snapshot_sync().on_revision_created(revision_id)
    }

    /// Called right after the host reverted `document_id` to `revision_id`.
    pub fn on_revision_restored(
        &self,
        document_id: EntityId,
        revision_id: EntityId,
    ) -> RevisionResult<usize> {
        self.snapshot_sync()
            .on_revision_restored(document_id, revision_id)
    }

    /// Called on every generic metadata read.
    pub fn on_metadata_read(
        &self,
        default: MetaRead,
        ctx: &RequestContext,
        entity_id: EntityId,
        key: &str,
        single: bool,
    ) -> RevisionResult<MetaRead> {
        self.snapshot_sync()
            .on_metadata_read(default, ctx, entity_id, key, single)
    }
}

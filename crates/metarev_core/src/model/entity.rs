//! Document and revision records.
//!
//! # Invariants
//! - A revision always carries the id of the document it was taken from.
//! - Revisions are never mutated after creation.

use crate::repo::meta_repo::{MetadataStore, RawMetadata};
use crate::repo::RepoResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier shared by documents and revisions.
pub type EntityId = Uuid;

/// Primary revisionable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds, maintained by storage.
    pub updated_at: i64,
}

impl Document {
    /// Creates a document with a generated id.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            updated_at: 0,
        }
    }
}

/// Immutable point-in-time record of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: EntityId,
    pub parent_id: EntityId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Explicit reference to either kind of metadata owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Document(EntityId),
    Revision(EntityId),
}

impl EntityRef {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Document(id) | Self::Revision(id) => *id,
        }
    }
}

/// Anything that owns a metadata store addressable by id.
///
/// Revisions expose their own metadata the same way documents do, so
/// snapshotting a revision never goes through its parent.
pub trait MetadataAddressable {
    fn metadata_id(&self) -> EntityId;

    fn get_all_metadata<S: MetadataStore + ?Sized>(&self, store: &S) -> RepoResult<RawMetadata> {
        store.get_all_metadata(self.metadata_id())
    }

    fn get_metadata<S: MetadataStore + ?Sized>(
        &self,
        store: &S,
        key: &str,
    ) -> RepoResult<Option<String>> {
        store.get_single_metadata_value(self.metadata_id(), key)
    }
}

impl MetadataAddressable for Document {
    fn metadata_id(&self) -> EntityId {
        self.id
    }
}

impl MetadataAddressable for Revision {
    fn metadata_id(&self) -> EntityId {
        self.id
    }
}

impl MetadataAddressable for EntityRef {
    fn metadata_id(&self) -> EntityId {
        self.id()
    }
}

//! Revisioning use-case services and host callbacks.
//!
//! # Responsibility
//! - Detect metadata changes that warrant a new revision.
//! - Present metadata keys as comparable revision fields.
//! - Copy snapshots onto revisions and back onto documents.
//!
//! # Invariants
//! - Storage failures surface as `StorageUnavailable`, never as "no metadata".
//! - Services hold no state across calls besides policy and collaborators.

use crate::model::entity::EntityId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod change_detector;
pub mod field_presenter;
pub mod revision_meta_service;
pub mod snapshot_sync;

pub type RevisionResult<T> = Result<T, RevisionError>;

/// Service error for metadata revisioning.
#[derive(Debug)]
pub enum RevisionError {
    /// Metadata store could not serve the request.
    StorageUnavailable(RepoError),
    /// Id passed as a revision does not resolve to a revision record.
    RevisionNotFound(EntityId),
}

impl Display for RevisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "metadata storage unavailable: {err}"),
            Self::RevisionNotFound(id) => write!(f, "revision not found: {id}"),
        }
    }
}

impl Error for RevisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::RevisionNotFound(_) => None,
        }
    }
}

impl From<RepoError> for RevisionError {
    fn from(value: RepoError) -> Self {
        Self::StorageUnavailable(value)
    }
}

//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the storage interface the revisioning core consumes.
//! - Keep SQL details out of snapshot and service code.
//!
//! # Invariants
//! - `NotFound` is a semantic error, distinct from transport failures.
//! - Metadata values inside one key keep insertion order.

use crate::db::DbError;
use crate::model::entity::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entity_repo;
pub mod meta_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity and metadata persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(EntityId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

//! Metadata storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide key -> value(s) CRUD for any entity id (document or revision).
//! - Resolve a revision's parent document for snapshot capture.
//!
//! # Invariants
//! - Values of one key are returned in insertion (`meta_id`) order.
//! - `replace_metadata` swaps the whole value set of one key in one transaction.
//! - Presence of a value is decided by row existence, never by its content.

use crate::model::entity::EntityId;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

/// All stored values of one entity, grouped by key. Key order is unspecified.
pub type RawMetadata = HashMap<String, Vec<String>>;

/// Key -> value(s) storage addressed polymorphically by entity id.
pub trait MetadataStore {
    /// Returns every stored value of `entity_id`, grouped by key.
    fn get_all_metadata(&self, entity_id: EntityId) -> RepoResult<RawMetadata>;

    /// Returns the first stored value of `key`, or `None` when no row exists.
    fn get_single_metadata_value(&self, entity_id: EntityId, key: &str)
        -> RepoResult<Option<String>>;

    /// Appends one more value under `key`.
    fn add_metadata(&self, entity_id: EntityId, key: &str, value: &str) -> RepoResult<()>;

    /// Replaces all values under `key` with `values`, in order.
    fn replace_metadata(&self, entity_id: EntityId, key: &str, values: &[String])
        -> RepoResult<()>;

    /// Removes every value under `key`. Returns the number of removed rows.
    fn delete_metadata(&self, entity_id: EntityId, key: &str) -> RepoResult<usize>;

    /// Replaces all values under `key` with a single `value`.
    fn set_metadata(&self, entity_id: EntityId, key: &str, value: &str) -> RepoResult<()> {
        self.replace_metadata(entity_id, key, &[value.to_string()])
    }
}

/// Resolves revision records to the document they were taken from.
pub trait RevisionLookup {
    /// Returns the parent document id, or `None` when `revision_id` is not a revision.
    fn revision_parent(&self, revision_id: EntityId) -> RepoResult<Option<EntityId>>;
}

impl<T: MetadataStore + ?Sized> MetadataStore for &T {
    fn get_all_metadata(&self, entity_id: EntityId) -> RepoResult<RawMetadata> {
        (**self).get_all_metadata(entity_id)
    }

    fn get_single_metadata_value(
        &self,
        entity_id: EntityId,
        key: &str,
    ) -> RepoResult<Option<String>> {
        (**self).get_single_metadata_value(entity_id, key)
    }

    fn add_metadata(&self, entity_id: EntityId, key: &str, value: &str) -> RepoResult<()> {
        (**self).add_metadata(entity_id, key, value)
    }

    fn replace_metadata(
        &self,
        entity_id: EntityId,
        key: &str,
        values: &[String],
    ) -> RepoResult<()> {
        (**self).replace_metadata(entity_id, key, values)
    }

    fn delete_metadata(&self, entity_id: EntityId, key: &str) -> RepoResult<usize> {
        (**self).delete_metadata(entity_id, key)
    }
}

impl<T: RevisionLookup + ?Sized> RevisionLookup for &T {
    fn revision_parent(&self, revision_id: EntityId) -> RepoResult<Option<EntityId>> {
        (**self).revision_parent(revision_id)
    }
}

/// SQLite-backed metadata store over the `entity_meta` table.
pub struct SqliteMetadataStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMetadataStore<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MetadataStore for SqliteMetadataStore<'_> {
    fn get_all_metadata(&self, entity_id: EntityId) -> RepoResult<RawMetadata> {
        let mut stmt = self.conn.prepare(
            "SELECT meta_key, meta_value
             FROM entity_meta
             WHERE entity_uuid = ?1
             ORDER BY meta_id ASC;",
        )?;
        let mut rows = stmt.query([entity_id.to_string()])?;

        let mut metadata = RawMetadata::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get("meta_key")?;
            let value: String = row.get("meta_value")?;
            metadata.entry(key).or_default().push(value);
        }
        Ok(metadata)
    }

    fn get_single_metadata_value(
        &self,
        entity_id: EntityId,
        key: &str,
    ) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT meta_value
                 FROM entity_meta
                 WHERE entity_uuid = ?1 AND meta_key = ?2
                 ORDER BY meta_id ASC
                 LIMIT 1;",
                params![entity_id.to_string(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn add_metadata(&self, entity_id: EntityId, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO entity_meta (entity_uuid, meta_key, meta_value) VALUES (?1, ?2, ?3);",
            params![entity_id.to_string(), key, value],
        )?;
        Ok(())
    }

    fn replace_metadata(
        &self,
        entity_id: EntityId,
        key: &str,
        values: &[String],
    ) -> RepoResult<()> {
        let entity_uuid = entity_id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM entity_meta WHERE entity_uuid = ?1 AND meta_key = ?2;",
            params![entity_uuid, key],
        )?;
        for value in values {
            tx.execute(
                "INSERT INTO entity_meta (entity_uuid, meta_key, meta_value) VALUES (?1, ?2, ?3);",
                params![entity_uuid, key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_metadata(&self, entity_id: EntityId, key: &str) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM entity_meta WHERE entity_uuid = ?1 AND meta_key = ?2;",
            params![entity_id.to_string(), key],
        )?;
        Ok(removed)
    }
}

//! Document/revision repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store primary document content and immutable revision records.
//! - Resolve revisions to their parent document (`RevisionLookup`).
//!
//! # Invariants
//! - Revision rows are insert-only; no API updates them.
//! - `create_revision` copies primary content only. Metadata capture is the
//!   caller's job (`SnapshotSync::on_revision_created`).
//! - Revision listing is ordered newest first (`created_at DESC, rowid DESC`).

use crate::model::entity::{Document, EntityId, Revision};
use crate::repo::meta_repo::RevisionLookup;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const REVISION_SELECT_SQL: &str = "SELECT uuid, parent_uuid, title, content, created_at
FROM entities
WHERE kind = 'revision'";

/// Repository interface for documents and their revisions.
pub trait EntityRepository {
    fn create_document(&self, document: &Document) -> RepoResult<EntityId>;
    /// Replaces title and content of an existing document.
    fn update_document(&self, document: &Document) -> RepoResult<()>;
    fn get_document(&self, id: EntityId) -> RepoResult<Option<Document>>;
    /// Inserts a new revision holding the document's current primary content.
    fn create_revision(&self, document_id: EntityId) -> RepoResult<Revision>;
    fn get_revision(&self, id: EntityId) -> RepoResult<Option<Revision>>;
    /// Lists revisions of one document, newest first.
    fn list_revisions(&self, document_id: EntityId) -> RepoResult<Vec<Revision>>;
    /// Copies a revision's primary content back onto its document.
    fn restore_revision_content(&self, document_id: EntityId, revision_id: EntityId)
        -> RepoResult<()>;
}

/// SQLite-backed entity repository over the `entities` table.
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the newest revision of `document_id`, if any.
    pub fn latest_revision(&self, document_id: EntityId) -> RepoResult<Option<Revision>> {
        Ok(self.list_revisions(document_id)?.into_iter().next())
    }
}

impl EntityRepository for SqliteEntityRepository<'_> {
    fn create_document(&self, document: &Document) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO entities (uuid, kind, title, content) VALUES (?1, 'document', ?2, ?3);",
            params![
                document.id.to_string(),
                document.title.as_str(),
                document.content.as_str()
            ],
        )?;
        Ok(document.id)
    }

    fn update_document(&self, document: &Document) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE entities
             SET
                title = ?1,
                content = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?3 AND kind = 'document';",
            params![
                document.title.as_str(),
                document.content.as_str(),
                document.id.to_string()
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(document.id));
        }
        Ok(())
    }

    fn get_document(&self, id: EntityId) -> RepoResult<Option<Document>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, title, content, updated_at
                 FROM entities
                 WHERE uuid = ?1 AND kind = 'document';",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("uuid")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, String>("content")?,
                        row.get::<_, i64>("updated_at")?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((uuid_text, title, content, updated_at)) => Ok(Some(Document {
                id: parse_uuid(&uuid_text, "entities.uuid")?,
                title,
                content,
                updated_at,
            })),
            None => Ok(None),
        }
    }

    fn create_revision(&self, document_id: EntityId) -> RepoResult<Revision> {
        let revision_id = Uuid::new_v4();
        let changed = self.conn.execute(
            "INSERT INTO entities (uuid, kind, parent_uuid, title, content)
             SELECT ?1, 'revision', uuid, title, content
             FROM entities
             WHERE uuid = ?2 AND kind = 'document';",
            params![revision_id.to_string(), document_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(document_id));
        }

        self.get_revision(revision_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("revision {revision_id} missing after insert"))
        })
    }

    fn get_revision(&self, id: EntityId) -> RepoResult<Option<Revision>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REVISION_SELECT_SQL} AND uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_revision_row(row)?));
        }

        Ok(None)
    }

    fn list_revisions(&self, document_id: EntityId) -> RepoResult<Vec<Revision>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REVISION_SELECT_SQL}
               AND parent_uuid = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([document_id.to_string()])?;

        let mut revisions = Vec::new();
        while let Some(row) = rows.next()? {
            revisions.push(parse_revision_row(row)?);
        }
        Ok(revisions)
    }

    fn restore_revision_content(
        &self,
        document_id: EntityId,
        revision_id: EntityId,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE entities
             SET
                title = (SELECT title FROM entities WHERE uuid = ?2),
                content = (SELECT content FROM entities WHERE uuid = ?2),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND kind = 'document'
               AND EXISTS (
                   SELECT 1 FROM entities
                   WHERE uuid = ?2 AND kind = 'revision' AND parent_uuid = ?1
               );",
            params![document_id.to_string(), revision_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(revision_id));
        }
        Ok(())
    }
}

impl RevisionLookup for SqliteEntityRepository<'_> {
    fn revision_parent(&self, revision_id: EntityId) -> RepoResult<Option<EntityId>> {
        let parent = self
            .conn
            .query_row(
                "SELECT parent_uuid FROM entities WHERE uuid = ?1 AND kind = 'revision';",
                [revision_id.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        parent
            .map(|text| parse_uuid(&text, "entities.parent_uuid"))
            .transpose()
    }
}

fn parse_revision_row(row: &Row<'_>) -> RepoResult<Revision> {
    let uuid_text: String = row.get("uuid")?;
    let parent_text: String = row.get("parent_uuid")?;
    Ok(Revision {
        id: parse_uuid(&uuid_text, "entities.uuid")?,
        parent_id: parse_uuid(&parent_text, "entities.parent_uuid")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<EntityId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

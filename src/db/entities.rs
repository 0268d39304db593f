//! Kind-guarded entity rows
//!
//! `works`, `sources` and `plans` share one row shape, so the operations here
//! take the table as a parameter and treat `body` as opaque text. The typed
//! helpers [`put`] and [`load`] sit on top and go through the model's
//! tagged unions.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use super::id_text;
use crate::error::CatalogError;
use crate::model::{Entity, EntityTable};

/// What an accepted upsert did to the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created)
    }
}

/// A raw entity row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntity {
    pub id: Uuid,
    pub kind: String,
    pub body: String,
    pub revision: i64,
}

/// Insert a row, or overwrite its body if it already exists with the same kind.
///
/// The insert, the kind guard and the created/updated decision happen in one
/// statement: the conflicting update only fires when the stored kind matches,
/// and `RETURNING revision` yields 1 for a fresh row, more for an overwrite,
/// and nothing at all when the guard rejected the write.
pub fn upsert_entity(
    conn: &Connection,
    table: EntityTable,
    id: Uuid,
    kind: &str,
    body: &str,
) -> Result<UpsertOutcome, CatalogError> {
    if id.is_nil() {
        return Err(CatalogError::InvalidInput(format!("{} id cannot be nil", table)));
    }
    if !table.is_valid_kind(kind) {
        return Err(CatalogError::InvalidInput(format!("invalid {} kind: {:?}", table, kind)));
    }

    let sql = format!(
        "INSERT INTO {t} (id, kind, body) VALUES (?1, ?2, ?3) \
         ON CONFLICT (id) DO UPDATE SET body = excluded.body, revision = {t}.revision + 1 \
         WHERE {t}.kind = excluded.kind \
         RETURNING revision",
        t = table.as_str()
    );

    let revision: Option<i64> = conn
        .prepare_cached(&sql)?
        .query_row(params![id_text(id), kind, body], |row| row.get(0))
        .optional()?;

    match revision {
        None => {
            debug!(table = %table, id = %id, kind = kind, "Upsert rejected: kind mismatch");
            Err(CatalogError::KindConflict {
                table: table.as_str(),
                id,
            })
        }
        Some(1) => {
            debug!(table = %table, id = %id, kind = kind, "Created entity");
            Ok(UpsertOutcome::Created)
        }
        Some(revision) => {
            debug!(table = %table, id = %id, kind = kind, revision, "Updated entity");
            Ok(UpsertOutcome::Updated)
        }
    }
}

/// Exact-match read of one row
pub fn get_entity(
    conn: &Connection,
    table: EntityTable,
    id: Uuid,
) -> Result<StoredEntity, CatalogError> {
    let sql = format!("SELECT kind, body, revision FROM {} WHERE id = ?1", table.as_str());

    conn.prepare_cached(&sql)?
        .query_row(params![id_text(id)], |row| {
            Ok(StoredEntity {
                id,
                kind: row.get(0)?,
                body: row.get(1)?,
                revision: row.get(2)?,
            })
        })
        .optional()?
        .ok_or(CatalogError::NotFound {
            table: table.as_str(),
            id,
        })
}

/// Upsert a typed entity into its table
pub fn put<E: Entity>(conn: &Connection, id: Uuid, entity: &E) -> Result<UpsertOutcome, CatalogError> {
    let body = entity.to_body()?;
    upsert_entity(conn, E::TABLE, id, entity.kind_tag(), &body)
}

/// Read a typed entity from its table
pub fn load<E: Entity>(conn: &Connection, id: Uuid) -> Result<E, CatalogError> {
    let stored = get_entity(conn, E::TABLE, id)?;
    E::from_stored(&stored.kind, &stored.body)
}

/// Number of rows in an entity table
pub fn count_entities(conn: &Connection, table: EntityTable) -> Result<u64, CatalogError> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count as u64)
}

//! SQLite storage for catalog entities
//!
//! ## Tables
//!
//! - `works`, `sources`, `plans` - entity rows `(id, kind, body, revision)`
//! - `plan_inputs` - plan → source relation (one row per plan)
//! - `plan_outputs` - plan → work relation (one row per plan)
//!
//! ## Transactions
//!
//! Writes go through [`CatalogDb::write`], which runs the closure inside a
//! single `IMMEDIATE` transaction and commits only if it returns `Ok`.
//! Reads go through [`CatalogDb::read`]. A multi-page listing is a sequence of
//! independent reads; rows inserted behind an issued cursor are not revisited.

pub mod entities;
pub mod plan_query;
pub mod relations;
pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CatalogError;
use crate::model::EntityTable;

/// SQLite database holding the catalog
pub struct CatalogDb {
    conn: Mutex<Connection>,
}

impl CatalogDb {
    /// Open or create the catalog database file
    pub fn open(db_path: &Path) -> Result<Self, CatalogError> {
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // WAL for concurrent readers; foreign keys keep relation rows honest
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<(), CatalogError> {
        self.with_conn(schema::init_schema)
    }

    /// Run a closure with shared access to the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&Connection) -> Result<T, CatalogError>,
    {
        let conn = self.conn.lock().map_err(|_| CatalogError::LockPoisoned)?;
        f(&conn)
    }

    /// Run a closure with exclusive access to the connection
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&mut Connection) -> Result<T, CatalogError>,
    {
        let mut conn = self.conn.lock().map_err(|_| CatalogError::LockPoisoned)?;
        f(&mut conn)
    }

    /// Run a closure inside one write transaction.
    ///
    /// The transaction commits only when the closure returns `Ok`; on `Err`
    /// it is dropped, which rolls back every statement the closure issued.
    pub fn write<F, T>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, CatalogError>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Run a closure inside one read transaction
    pub fn read<F, T>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, CatalogError>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, CatalogError> {
        self.with_conn(|conn| {
            Ok(DbStats {
                work_count: entities::count_entities(conn, EntityTable::Works)?,
                source_count: entities::count_entities(conn, EntityTable::Sources)?,
                plan_count: entities::count_entities(conn, EntityTable::Plans)?,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub work_count: u64,
    pub source_count: u64,
    pub plan_count: u64,
}

/// Ids are stored as lowercase hyphenated text, which sorts the same way as
/// the raw bytes.
pub(crate) fn id_text(id: Uuid) -> String {
    id.hyphenated().to_string()
}

/// Parse an id column back into a `Uuid`
pub(crate) fn parse_id(column: usize, text: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileSource, Source};

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let id = Uuid::new_v4();
        {
            let db = CatalogDb::open(&path).unwrap();
            db.write(|tx| {
                entities::put(tx, id, &Source::File(FileSource { path: "/a.mkv".into() }))
            })
            .unwrap();
        }

        // Reopening keeps the data and does not re-create the schema
        let db = CatalogDb::open(&path).unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.source_count, 1);
        assert_eq!(stats.work_count, 0);
        assert_eq!(stats.plan_count, 0);
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let db = CatalogDb::open_in_memory().unwrap();
        let id = Uuid::new_v4();

        let result: Result<(), CatalogError> = db.write(|tx| {
            entities::put(tx, id, &Source::File(FileSource { path: "/a.mkv".into() }))?;
            Err(CatalogError::InvalidInput("abort".into()))
        });
        assert!(result.is_err());

        assert_eq!(db.stats().unwrap().source_count, 0);
    }

    #[test]
    fn test_id_text_sorts_like_bytes() {
        let low = Uuid::from_bytes([0x0a; 16]);
        let high = Uuid::from_bytes([0xa0; 16]);
        assert!(id_text(low) < id_text(high));
        assert_eq!(parse_id(0, &id_text(high)).unwrap(), high);
        assert!(parse_id(0, "nope").is_err());
    }
}

//! Database schema definitions

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::CatalogError;

/// Migration steps in order. Step `n` takes a database from v`n` to v`n + 1`;
/// new schema changes are appended here, never edited in place.
const MIGRATIONS: &[&[&str]] = &[&[ENTITY_SCHEMA, RELATION_SCHEMA]];

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Initialize the database schema, running every migration step the stored
/// version has not seen yet
pub fn init_schema(conn: &Connection) -> Result<(), CatalogError> {
    let current_version = get_schema_version(conn)?;

    if current_version >= SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    let pending = MIGRATIONS.iter().enumerate().skip(current_version.max(0) as usize);
    for (index, batches) in pending {
        let version = index as i32 + 1;
        info!("Migrating schema to v{}", version);
        for batch in batches.iter() {
            conn.execute_batch(batch)?;
        }
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, CatalogError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), CatalogError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])?;
    Ok(())
}

/// Entity tables. `revision` starts at 1 and is bumped on every accepted
/// update, which is how an upsert tells a fresh insert from an overwrite.
const ENTITY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS works (
    id TEXT PRIMARY KEY NOT NULL,
    kind TEXT NOT NULL,
    body TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS sources (
    id TEXT PRIMARY KEY NOT NULL,
    kind TEXT NOT NULL,
    body TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS plans (
    id TEXT PRIMARY KEY NOT NULL,
    kind TEXT NOT NULL,
    body TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);
"#;

/// Plan relation tables. Shaped as many-to-many, kept at exactly one row per
/// plan by the relation tracker.
const RELATION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS plan_inputs (
    plan_id TEXT NOT NULL REFERENCES plans(id),
    source_id TEXT NOT NULL REFERENCES sources(id)
);

CREATE TABLE IF NOT EXISTS plan_outputs (
    plan_id TEXT NOT NULL REFERENCES plans(id),
    work_id TEXT NOT NULL REFERENCES works(id)
);

CREATE INDEX IF NOT EXISTS idx_plan_inputs_plan ON plan_inputs(plan_id);
CREATE INDEX IF NOT EXISTS idx_plan_inputs_source ON plan_inputs(source_id);
CREATE INDEX IF NOT EXISTS idx_plan_outputs_plan ON plan_outputs(plan_id);
CREATE INDEX IF NOT EXISTS idx_plan_outputs_work ON plan_outputs(work_id);
"#;

//! Plan relation rows
//!
//! `plan_inputs` and `plan_outputs` hold the plan's source and work. Each is
//! maintained as "replace the single current value": delete every row for the
//! plan, then insert one. The replace functions take a [`Transaction`] so they
//! can only run inside the write that also stores the plan body.

use rusqlite::{params, Connection, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{id_text, parse_id};
use crate::error::CatalogError;

/// Which side of a plan a relation table records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRelation {
    /// Plan → Source
    Input,
    /// Plan → Work
    Output,
}

impl PlanRelation {
    pub fn table(&self) -> &'static str {
        match self {
            PlanRelation::Input => "plan_inputs",
            PlanRelation::Output => "plan_outputs",
        }
    }

    /// Column holding the referenced entity id
    pub fn ref_column(&self) -> &'static str {
        match self {
            PlanRelation::Input => "source_id",
            PlanRelation::Output => "work_id",
        }
    }
}

/// Replace all relation rows for `plan_id` with a single `(plan_id, ref_id)` row
pub fn replace_relation(
    tx: &Transaction<'_>,
    relation: PlanRelation,
    plan_id: Uuid,
    ref_id: Uuid,
) -> Result<(), CatalogError> {
    let plan_key = id_text(plan_id);

    let removed = tx
        .prepare_cached(&format!("DELETE FROM {} WHERE plan_id = ?1", relation.table()))?
        .execute(params![plan_key])?;

    tx.prepare_cached(&format!(
        "INSERT INTO {} (plan_id, {}) VALUES (?1, ?2)",
        relation.table(),
        relation.ref_column()
    ))?
    .execute(params![plan_key, id_text(ref_id)])?;

    debug!(
        table = relation.table(),
        plan_id = %plan_id,
        ref_id = %ref_id,
        removed,
        "Replaced plan relation"
    );
    Ok(())
}

/// Point the plan at a new input source
pub fn replace_plan_input(tx: &Transaction<'_>, plan_id: Uuid, source_id: Uuid) -> Result<(), CatalogError> {
    replace_relation(tx, PlanRelation::Input, plan_id, source_id)
}

/// Point the plan at a new output work
pub fn replace_plan_output(tx: &Transaction<'_>, plan_id: Uuid, work_id: Uuid) -> Result<(), CatalogError> {
    replace_relation(tx, PlanRelation::Output, plan_id, work_id)
}

/// Current relation rows for a plan, in insertion order
pub fn relation_ids(
    conn: &Connection,
    relation: PlanRelation,
    plan_id: Uuid,
) -> Result<Vec<Uuid>, CatalogError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM {} WHERE plan_id = ?1 ORDER BY rowid",
        relation.ref_column(),
        relation.table()
    ))?;

    let ids = stmt
        .query_map(params![id_text(plan_id)], |row| {
            let text: String = row.get(0)?;
            parse_id(0, &text)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ids)
}

pub fn plan_input_ids(conn: &Connection, plan_id: Uuid) -> Result<Vec<Uuid>, CatalogError> {
    relation_ids(conn, PlanRelation::Input, plan_id)
}

pub fn plan_output_ids(conn: &Connection, plan_id: Uuid) -> Result<Vec<Uuid>, CatalogError> {
    relation_ids(conn, PlanRelation::Output, plan_id)
}

//! Filtered, cursor-paginated plan listing

use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use super::{id_text, parse_id};
use crate::error::CatalogError;
use crate::model::{Entity, Plan};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 500;

/// Optional equality filters on a plan's relations. Both together are a
/// conjunction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFilter {
    pub source_id: Option<Uuid>,
    pub work_id: Option<Uuid>,
}

/// One listed plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    pub id: Uuid,
    pub plan: Plan,
}

/// One page of plans in ascending id order
#[derive(Debug, Clone, Default)]
pub struct PlanPage {
    pub items: Vec<PlanRecord>,
    pub has_more: bool,
    /// Id of the last returned item
    pub last_key: Option<Uuid>,
}

impl PlanPage {
    /// Resume point for the next page, only when there is one
    pub fn next_cursor(&self) -> Option<Uuid> {
        if self.has_more {
            self.last_key
        } else {
            None
        }
    }
}

/// Resolve a requested page size: default when absent, clamped into range otherwise
pub fn clamp_page_size(requested: Option<i64>) -> u32 {
    match requested {
        None => DEFAULT_PAGE_SIZE,
        Some(n) => n.clamp(MIN_PAGE_SIZE as i64, MAX_PAGE_SIZE as i64) as u32,
    }
}

/// Build the SQL and bound parameters for one page.
///
/// Selects `page_size + 1` rows so the caller can tell whether another page
/// follows without a second query.
pub fn compose_list_query(
    filter: &PlanFilter,
    cursor: Option<Uuid>,
    page_size: u32,
) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut sql = String::from("SELECT DISTINCT p.id, p.kind, p.body FROM plans p");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];
    let mut conditions = vec![];

    if let Some(source_id) = filter.source_id {
        sql.push_str(" INNER JOIN plan_inputs pi ON p.id = pi.plan_id");
        conditions.push("pi.source_id = ?");
        params.push(Box::new(id_text(source_id)));
    }

    if let Some(work_id) = filter.work_id {
        sql.push_str(" INNER JOIN plan_outputs po ON p.id = po.plan_id");
        conditions.push("po.work_id = ?");
        params.push(Box::new(id_text(work_id)));
    }

    if let Some(after) = cursor {
        conditions.push("p.id > ?");
        params.push(Box::new(id_text(after)));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(" ORDER BY p.id ASC LIMIT ?");
    params.push(Box::new(page_size as i64 + 1));

    (sql, params)
}

/// Fetch one page of plans
pub fn list_plans(
    conn: &Connection,
    filter: &PlanFilter,
    cursor: Option<Uuid>,
    page_size: u32,
) -> Result<PlanPage, CatalogError> {
    let page_size = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
    let (sql, params) = compose_list_query(filter, cursor, page_size);

    debug!("Executing query: {}", sql);

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let id: String = row.get(0)?;
            Ok((parse_id(0, &id)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let has_more = rows.len() > page_size as usize;

    let mut items = Vec::with_capacity(rows.len().min(page_size as usize));
    for (id, kind, body) in rows.into_iter().take(page_size as usize) {
        items.push(PlanRecord {
            id,
            plan: Plan::from_stored(&kind, &body)?,
        });
    }

    let last_key = items.last().map(|item| item.id);
    debug!(count = items.len(), has_more, "Listed plans");

    Ok(PlanPage {
        items,
        has_more,
        last_key,
    })
}

//! Catalog service - transaction boundaries for entity operations
//!
//! Every write opens exactly one transaction. Plan writes store the body and
//! replace the relation rows inside that same transaction, so a failure at any
//! step leaves nothing behind.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::cursor;
use crate::db::entities::{self, UpsertOutcome};
use crate::db::plan_query::{self, PlanFilter};
use crate::db::relations;
use crate::db::{CatalogDb, DbStats};
use crate::error::CatalogError;
use crate::model::{Entity, Plan, Source, Work};
use crate::views::{ListPlansResponse, PlanPatch, PlanView, SourcePatch, WorkPatch};

/// Catalog service for business logic
pub struct CatalogService {
    db: Arc<CatalogDb>,
}

impl CatalogService {
    pub fn new(db: Arc<CatalogDb>) -> Self {
        Self { db }
    }

    pub fn stats(&self) -> Result<DbStats, CatalogError> {
        self.db.stats()
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    fn get<E: Entity>(&self, id: Uuid) -> Result<E, CatalogError> {
        self.db.read(|tx| entities::load::<E>(tx, id))
    }

    pub fn get_work(&self, id: Uuid) -> Result<Work, CatalogError> {
        self.get(id)
    }

    pub fn get_source(&self, id: Uuid) -> Result<Source, CatalogError> {
        self.get(id)
    }

    pub fn get_plan(&self, id: Uuid) -> Result<Plan, CatalogError> {
        self.get(id)
    }

    /// One page of plans. The token is decoded before any query runs.
    pub fn list_plans(
        &self,
        filter: &PlanFilter,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<ListPlansResponse, CatalogError> {
        let after = page_token.map(cursor::decode_page_token).transpose()?;

        let page = self
            .db
            .read(|tx| plan_query::list_plans(tx, filter, after, page_size))?;

        let next_page_token = page.next_cursor().map(cursor::encode_page_token);

        Ok(ListPlansResponse {
            plans: page.items.into_iter().map(PlanView::from).collect(),
            next_page_token,
        })
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    pub fn put_work(&self, id: Uuid, work: Work) -> Result<UpsertOutcome, CatalogError> {
        let outcome = self.db.write(|tx| entities::put(tx, id, &work))?;
        info!(id = %id, kind = work.kind_tag(), outcome = ?outcome, "Stored work");
        Ok(outcome)
    }

    pub fn patch_work(&self, id: Uuid, patch: WorkPatch) -> Result<(), CatalogError> {
        self.db.write(|tx| {
            let mut work = entities::load::<Work>(tx, id)?;
            patch.apply(id, &mut work)?;
            entities::put(tx, id, &work)
        })?;
        info!(id = %id, "Patched work");
        Ok(())
    }

    pub fn put_source(&self, id: Uuid, source: Source) -> Result<UpsertOutcome, CatalogError> {
        let outcome = self.db.write(|tx| entities::put(tx, id, &source))?;
        info!(id = %id, kind = source.kind_tag(), outcome = ?outcome, "Stored source");
        Ok(outcome)
    }

    pub fn patch_source(&self, id: Uuid, patch: SourcePatch) -> Result<(), CatalogError> {
        self.db.write(|tx| {
            let mut source = entities::load::<Source>(tx, id)?;
            patch.apply(id, &mut source)?;
            entities::put(tx, id, &source)
        })?;
        info!(id = %id, "Patched source");
        Ok(())
    }

    /// Create or replace a plan together with both of its relation rows
    pub fn put_plan(&self, id: Uuid, plan: Plan) -> Result<UpsertOutcome, CatalogError> {
        let outcome = self.db.write(|tx| {
            let outcome = entities::put(tx, id, &plan)?;
            relations::replace_plan_input(tx, id, plan.source_id())?;
            relations::replace_plan_output(tx, id, plan.work_id())?;
            Ok(outcome)
        })?;
        info!(id = %id, kind = plan.kind_tag(), outcome = ?outcome, "Stored plan");
        Ok(outcome)
    }

    /// Patch a plan; only the relations whose ids were supplied are replaced
    pub fn patch_plan(&self, id: Uuid, patch: PlanPatch) -> Result<(), CatalogError> {
        let (new_source, new_work) = (patch.source_id, patch.work_id);

        self.db.write(|tx| {
            let mut plan = entities::load::<Plan>(tx, id)?;
            patch.apply(id, &mut plan)?;
            entities::put(tx, id, &plan)?;

            if let Some(source_id) = new_source {
                relations::replace_plan_input(tx, id, source_id)?;
            }
            if let Some(work_id) = new_work {
                relations::replace_plan_output(tx, id, work_id)?;
            }
            Ok(())
        })?;

        info!(
            id = %id,
            input_replaced = new_source.is_some(),
            output_replaced = new_work.is_some(),
            "Patched plan"
        );
        Ok(())
    }
}

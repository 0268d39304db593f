//! View types for the HTTP API boundary
//!
//! Input views accept camelCase JSON with tri-state fields and validate into
//! model values (for PUT) or patches (for PATCH). Output views wrap a model
//! value with its id.
//!
//! Validation happens here, before any transaction is opened. Patches are
//! applied later, inside the write, against the row as it is stored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::plan_query::{clamp_page_size, PlanFilter, PlanRecord};
use crate::error::CatalogError;
use crate::model::{
    ChapterRangePlan, DirectPlan, DiscSource, FileSource, MovieEditionWork, MovieWork, Plan,
    PlanKind, Source, Work,
};
use crate::validate::{self, Field};

fn kind_conflict(table: &'static str, id: Uuid) -> CatalogError {
    CatalogError::KindConflict { table, id }
}

// ============================================================================
// Work Inputs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieWorkInputView {
    #[serde(default)]
    pub title: Field<String>,
    #[serde(default)]
    pub release_year: Field<i32>,
    #[serde(default)]
    pub tmdb_id: Field<i32>,
}

impl MovieWorkInputView {
    pub fn into_work(self) -> Result<Work, CatalogError> {
        Ok(Work::Movie(MovieWork {
            title: validate::required_text("title", self.title)?,
            release_year: self.release_year.into_option(),
            tmdb_id: self.tmdb_id.into_option(),
        }))
    }

    pub fn into_patch(self) -> Result<WorkPatch, CatalogError> {
        Ok(WorkPatch::Movie {
            title: validate::patch_text("title", self.title)?,
            release_year: self.release_year,
            tmdb_id: self.tmdb_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieEditionInputView {
    #[serde(default)]
    pub edition_type: Field<String>,
}

impl MovieEditionInputView {
    pub fn into_work(self) -> Result<Work, CatalogError> {
        Ok(Work::MovieEdition(MovieEditionWork {
            edition_type: validate::required_text("editionType", self.edition_type)?,
        }))
    }

    pub fn into_patch(self) -> Result<WorkPatch, CatalogError> {
        Ok(WorkPatch::MovieEdition {
            edition_type: validate::patch_text("editionType", self.edition_type)?,
        })
    }
}

/// Validated partial update of a work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkPatch {
    Movie {
        title: Option<String>,
        release_year: Field<i32>,
        tmdb_id: Field<i32>,
    },
    MovieEdition {
        edition_type: Option<String>,
    },
}

impl WorkPatch {
    /// Apply to the stored work; a patch of another kind is a conflict
    pub fn apply(self, id: Uuid, work: &mut Work) -> Result<(), CatalogError> {
        match (self, work) {
            (
                WorkPatch::Movie {
                    title,
                    release_year,
                    tmdb_id,
                },
                Work::Movie(movie),
            ) => {
                if let Some(title) = title {
                    movie.title = title;
                }
                release_year.apply_to(&mut movie.release_year);
                tmdb_id.apply_to(&mut movie.tmdb_id);
                Ok(())
            }
            (WorkPatch::MovieEdition { edition_type }, Work::MovieEdition(edition)) => {
                if let Some(edition_type) = edition_type {
                    edition.edition_type = edition_type;
                }
                Ok(())
            }
            _ => Err(kind_conflict("works", id)),
        }
    }
}

// ============================================================================
// Source Inputs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSourceInputView {
    #[serde(default)]
    pub path: Field<String>,
}

impl FileSourceInputView {
    pub fn into_source(self) -> Result<Source, CatalogError> {
        Ok(Source::File(FileSource {
            path: validate::required_text("path", self.path)?,
        }))
    }

    pub fn into_patch(self) -> Result<SourcePatch, CatalogError> {
        Ok(SourcePatch::File {
            path: validate::patch_text("path", self.path)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscSourceInputView {
    #[serde(default)]
    pub orig_dir_name: Field<String>,
    #[serde(default)]
    pub path: Field<String>,
    #[serde(default)]
    pub all_files_added: Field<bool>,
}

impl DiscSourceInputView {
    pub fn into_source(self) -> Result<Source, CatalogError> {
        Ok(Source::Disc(DiscSource {
            orig_dir_name: validate::required_text("origDirName", self.orig_dir_name)?,
            path: validate::required_text("path", self.path)?,
            all_files_added: validate::not_null("allFilesAdded", self.all_files_added)?.unwrap_or(false),
        }))
    }

    pub fn into_patch(self) -> Result<SourcePatch, CatalogError> {
        Ok(SourcePatch::Disc {
            orig_dir_name: validate::patch_text("origDirName", self.orig_dir_name)?,
            path: validate::patch_text("path", self.path)?,
            all_files_added: validate::not_null("allFilesAdded", self.all_files_added)?,
        })
    }
}

/// Validated partial update of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePatch {
    File {
        path: Option<String>,
    },
    Disc {
        orig_dir_name: Option<String>,
        path: Option<String>,
        all_files_added: Option<bool>,
    },
}

impl SourcePatch {
    pub fn apply(self, id: Uuid, source: &mut Source) -> Result<(), CatalogError> {
        match (self, source) {
            (SourcePatch::File { path }, Source::File(file)) => {
                if let Some(path) = path {
                    file.path = path;
                }
                Ok(())
            }
            (
                SourcePatch::Disc {
                    orig_dir_name,
                    path,
                    all_files_added,
                },
                Source::Disc(disc),
            ) => {
                if let Some(orig_dir_name) = orig_dir_name {
                    disc.orig_dir_name = orig_dir_name;
                }
                if let Some(path) = path {
                    disc.path = path;
                }
                if let Some(all_files_added) = all_files_added {
                    disc.all_files_added = all_files_added;
                }
                Ok(())
            }
            _ => Err(kind_conflict("sources", id)),
        }
    }
}

// ============================================================================
// Plan Inputs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectPlanInputView {
    #[serde(default)]
    pub source_uuid: Field<String>,
    #[serde(default)]
    pub work_uuid: Field<String>,
}

impl DirectPlanInputView {
    pub fn into_plan(self) -> Result<Plan, CatalogError> {
        Ok(Plan::Direct(DirectPlan {
            source_uuid: validate::required_uuid("sourceUuid", self.source_uuid)?,
            work_uuid: validate::required_uuid("workUuid", self.work_uuid)?,
        }))
    }

    pub fn into_patch(self) -> Result<PlanPatch, CatalogError> {
        Ok(PlanPatch {
            kind: PlanKind::Direct,
            source_id: validate::patch_uuid("sourceUuid", self.source_uuid)?,
            work_id: validate::patch_uuid("workUuid", self.work_uuid)?,
            start_chapter: Field::Absent,
            end_chapter: Field::Absent,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRangePlanInputView {
    #[serde(default)]
    pub source_uuid: Field<String>,
    #[serde(default)]
    pub work_uuid: Field<String>,
    #[serde(default)]
    pub start_chapter: Field<i32>,
    #[serde(default)]
    pub end_chapter: Field<i32>,
}

impl ChapterRangePlanInputView {
    pub fn into_plan(self) -> Result<Plan, CatalogError> {
        Ok(Plan::ChapterRange(ChapterRangePlan {
            source_uuid: validate::required_uuid("sourceUuid", self.source_uuid)?,
            work_uuid: validate::required_uuid("workUuid", self.work_uuid)?,
            start_chapter: self.start_chapter.into_option(),
            end_chapter: self.end_chapter.into_option(),
        }))
    }

    pub fn into_patch(self) -> Result<PlanPatch, CatalogError> {
        Ok(PlanPatch {
            kind: PlanKind::ChapterRange,
            source_id: validate::patch_uuid("sourceUuid", self.source_uuid)?,
            work_id: validate::patch_uuid("workUuid", self.work_uuid)?,
            start_chapter: self.start_chapter,
            end_chapter: self.end_chapter,
        })
    }
}

/// Validated partial update of a plan.
///
/// `source_id` / `work_id` are `Some` only when the caller supplied them; the
/// matching relation row is replaced only in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPatch {
    pub kind: PlanKind,
    pub source_id: Option<Uuid>,
    pub work_id: Option<Uuid>,
    pub start_chapter: Field<i32>,
    pub end_chapter: Field<i32>,
}

impl PlanPatch {
    pub fn apply(self, id: Uuid, plan: &mut Plan) -> Result<(), CatalogError> {
        if plan.kind() != self.kind {
            return Err(kind_conflict("plans", id));
        }
        if let Some(source_id) = self.source_id {
            plan.set_source_id(source_id);
        }
        if let Some(work_id) = self.work_id {
            plan.set_work_id(work_id);
        }
        if let Plan::ChapterRange(range) = plan {
            self.start_chapter.apply_to(&mut range.start_chapter);
            self.end_chapter.apply_to(&mut range.end_chapter);
        }
        Ok(())
    }
}

// ============================================================================
// Output Views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WorkView {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub work: Work,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceView {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub source: Source,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanView {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub plan: Plan,
}

impl From<PlanRecord> for PlanView {
    fn from(record: PlanRecord) -> Self {
        Self {
            uuid: record.id,
            plan: record.plan,
        }
    }
}

// ============================================================================
// Plan Listing
// ============================================================================

/// Query string of `GET /plans`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansParams {
    pub source_uuid: Option<String>,
    pub work_uuid: Option<String>,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

/// A validated listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPlansRequest {
    pub filter: PlanFilter,
    pub page_token: Option<String>,
    pub page_size: u32,
}

/// Empty and nil filter values mean "no filter"
fn filter_uuid(name: &str, value: Option<String>) -> Result<Option<Uuid>, CatalogError> {
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => {
            let id = Uuid::parse_str(text)
                .map_err(|_| CatalogError::InvalidInput(format!("{}: invalid UUID format", name)))?;
            Ok(if id.is_nil() { None } else { Some(id) })
        }
    }
}

impl ListPlansParams {
    pub fn into_request(self) -> Result<ListPlansRequest, CatalogError> {
        Ok(ListPlansRequest {
            filter: PlanFilter {
                source_id: filter_uuid("sourceUuid", self.source_uuid)?,
                work_id: filter_uuid("workUuid", self.work_uuid)?,
            },
            page_token: self.page_token.filter(|token| !token.is_empty()),
            page_size: clamp_page_size(self.page_size),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansResponse {
    pub plans: Vec<PlanView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

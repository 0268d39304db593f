//! Plans: how a source is turned into a work
//!
//! Every plan has exactly one input source and one output work. The ids live
//! in the body and are mirrored into the `plan_inputs` / `plan_outputs`
//! relation tables so plans can be listed by either side.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{unknown_kind, Entity, EntityTable};
use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Direct,
    ChapterRange,
}

impl PlanKind {
    pub const ALL_TAGS: &'static [&'static str] = &["direct", "chapter_range"];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Direct => "direct",
            PlanKind::ChapterRange => "chapter_range",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "direct" => Some(PlanKind::Direct),
            "chapter_range" => Some(PlanKind::ChapterRange),
            _ => None,
        }
    }
}

/// Use the whole source as the work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectPlan {
    pub source_uuid: Uuid,
    pub work_uuid: Uuid,
}

/// Use a chapter span of the source as the work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRangePlan {
    pub source_uuid: Uuid,
    pub work_uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_chapter: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_chapter: Option<i32>,
}

/// A row of the `plans` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Plan {
    Direct(DirectPlan),
    ChapterRange(ChapterRangePlan),
}

impl Plan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Plan::Direct(_) => PlanKind::Direct,
            Plan::ChapterRange(_) => PlanKind::ChapterRange,
        }
    }

    /// The plan's input source
    pub fn source_id(&self) -> Uuid {
        match self {
            Plan::Direct(p) => p.source_uuid,
            Plan::ChapterRange(p) => p.source_uuid,
        }
    }

    /// The plan's output work
    pub fn work_id(&self) -> Uuid {
        match self {
            Plan::Direct(p) => p.work_uuid,
            Plan::ChapterRange(p) => p.work_uuid,
        }
    }

    pub fn set_source_id(&mut self, id: Uuid) {
        match self {
            Plan::Direct(p) => p.source_uuid = id,
            Plan::ChapterRange(p) => p.source_uuid = id,
        }
    }

    pub fn set_work_id(&mut self, id: Uuid) {
        match self {
            Plan::Direct(p) => p.work_uuid = id,
            Plan::ChapterRange(p) => p.work_uuid = id,
        }
    }
}

impl Entity for Plan {
    const TABLE: EntityTable = EntityTable::Plans;

    fn kind_tag(&self) -> &'static str {
        self.kind().as_str()
    }

    fn to_body(&self) -> Result<String, CatalogError> {
        let body = match self {
            Plan::Direct(direct) => serde_json::to_string(direct)?,
            Plan::ChapterRange(range) => serde_json::to_string(range)?,
        };
        Ok(body)
    }

    fn from_stored(kind: &str, body: &str) -> Result<Self, CatalogError> {
        match PlanKind::parse(kind) {
            Some(PlanKind::Direct) => Ok(Plan::Direct(serde_json::from_str(body)?)),
            Some(PlanKind::ChapterRange) => Ok(Plan::ChapterRange(serde_json::from_str(body)?)),
            None => Err(unknown_kind(Self::TABLE, kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_accessors() {
        let source = Uuid::new_v4();
        let work = Uuid::new_v4();
        let mut plan = Plan::ChapterRange(ChapterRangePlan {
            source_uuid: source,
            work_uuid: work,
            start_chapter: Some(1),
            end_chapter: Some(5),
        });
        assert_eq!(plan.source_id(), source);
        assert_eq!(plan.work_id(), work);

        let other = Uuid::new_v4();
        plan.set_source_id(other);
        assert_eq!(plan.source_id(), other);
        assert_eq!(plan.work_id(), work);
    }

    #[test]
    fn test_chapter_range_body_uses_camel_case() {
        let plan = Plan::ChapterRange(ChapterRangePlan {
            source_uuid: Uuid::nil(),
            work_uuid: Uuid::nil(),
            start_chapter: Some(2),
            end_chapter: None,
        });
        let body = plan.to_body().unwrap();
        assert!(body.contains(r#""startChapter":2"#));
        assert!(!body.contains("endChapter"));
        assert_eq!(plan.kind_tag(), "chapter_range");
    }

    #[test]
    fn test_view_serialization_is_externally_tagged() {
        let plan = Plan::Direct(DirectPlan {
            source_uuid: Uuid::nil(),
            work_uuid: Uuid::nil(),
        });
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json.get("direct").is_some());
    }
}

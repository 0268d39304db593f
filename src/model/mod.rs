//! Catalog entity model
//!
//! Every entity table stores rows of `(id, kind, body)`. The `kind` tag selects
//! the body schema, so each table is modelled as a closed tagged union:
//!
//! | Table     | Union    | Kinds                          |
//! |-----------|----------|--------------------------------|
//! | `works`   | [`Work`]   | `movie`, `movieEdition`      |
//! | `sources` | [`Source`] | `file`, `disc`               |
//! | `plans`   | [`Plan`]   | `direct`, `chapter_range`    |
//!
//! Stored tags are parsed exactly once, on the way out of the database, and an
//! unrecognized tag is an error rather than a default.

pub mod plan;
pub mod source;
pub mod work;

use crate::error::CatalogError;

pub use plan::{ChapterRangePlan, DirectPlan, Plan, PlanKind};
pub use source::{DiscSource, FileSource, Source, SourceKind};
pub use work::{MovieEditionWork, MovieWork, Work, WorkKind};

/// The three entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTable {
    Works,
    Sources,
    Plans,
}

impl EntityTable {
    /// SQL table name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityTable::Works => "works",
            EntityTable::Sources => "sources",
            EntityTable::Plans => "plans",
        }
    }

    /// Kind tags accepted by this table
    pub fn valid_kinds(&self) -> &'static [&'static str] {
        match self {
            EntityTable::Works => WorkKind::ALL_TAGS,
            EntityTable::Sources => SourceKind::ALL_TAGS,
            EntityTable::Plans => PlanKind::ALL_TAGS,
        }
    }

    pub fn is_valid_kind(&self, kind: &str) -> bool {
        self.valid_kinds().contains(&kind)
    }
}

impl std::fmt::Display for EntityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind-discriminated entity that can be written to and read from its table.
pub trait Entity: Sized {
    const TABLE: EntityTable;

    /// Persisted kind tag of this value
    fn kind_tag(&self) -> &'static str;

    /// Serialize the kind-specific body (without the tag)
    fn to_body(&self) -> Result<String, CatalogError>;

    /// Rebuild a value from a stored `(kind, body)` pair
    fn from_stored(kind: &str, body: &str) -> Result<Self, CatalogError>;
}

pub(crate) fn unknown_kind(table: EntityTable, kind: &str) -> CatalogError {
    CatalogError::UnknownKind {
        table: table.as_str(),
        kind: kind.to_string(),
    }
}

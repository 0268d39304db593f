//! Works: the things a catalog entry is about (movies and their editions)

use serde::{Deserialize, Serialize};

use super::{unknown_kind, Entity, EntityTable};
use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    Movie,
    MovieEdition,
}

impl WorkKind {
    pub const ALL_TAGS: &'static [&'static str] = &["movie", "movieEdition"];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkKind::Movie => "movie",
            WorkKind::MovieEdition => "movieEdition",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "movie" => Some(WorkKind::Movie),
            "movieEdition" => Some(WorkKind::MovieEdition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieWork {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieEditionWork {
    pub edition_type: String,
}

/// A row of the `works` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Work {
    Movie(MovieWork),
    MovieEdition(MovieEditionWork),
}

impl Work {
    pub fn kind(&self) -> WorkKind {
        match self {
            Work::Movie(_) => WorkKind::Movie,
            Work::MovieEdition(_) => WorkKind::MovieEdition,
        }
    }
}

impl Entity for Work {
    const TABLE: EntityTable = EntityTable::Works;

    fn kind_tag(&self) -> &'static str {
        self.kind().as_str()
    }

    fn to_body(&self) -> Result<String, CatalogError> {
        let body = match self {
            Work::Movie(movie) => serde_json::to_string(movie)?,
            Work::MovieEdition(edition) => serde_json::to_string(edition)?,
        };
        Ok(body)
    }

    fn from_stored(kind: &str, body: &str) -> Result<Self, CatalogError> {
        match WorkKind::parse(kind) {
            Some(WorkKind::Movie) => Ok(Work::Movie(serde_json::from_str(body)?)),
            Some(WorkKind::MovieEdition) => Ok(Work::MovieEdition(serde_json::from_str(body)?)),
            None => Err(unknown_kind(Self::TABLE, kind)),
        }
    }
}

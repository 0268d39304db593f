//! Sources: where the media for a work comes from

use serde::{Deserialize, Serialize};

use super::{unknown_kind, Entity, EntityTable};
use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    File,
    Disc,
}

impl SourceKind {
    pub const ALL_TAGS: &'static [&'static str] = &["file", "disc"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Disc => "disc",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "file" => Some(SourceKind::File),
            "disc" => Some(SourceKind::Disc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSource {
    pub path: String,
}

/// A ripped disc directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscSource {
    pub orig_dir_name: String,
    pub path: String,
    #[serde(default)]
    pub all_files_added: bool,
}

/// A row of the `sources` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    File(FileSource),
    Disc(DiscSource),
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::File(_) => SourceKind::File,
            Source::Disc(_) => SourceKind::Disc,
        }
    }
}

impl Entity for Source {
    const TABLE: EntityTable = EntityTable::Sources;

    fn kind_tag(&self) -> &'static str {
        self.kind().as_str()
    }

    fn to_body(&self) -> Result<String, CatalogError> {
        let body = match self {
            Source::File(file) => serde_json::to_string(file)?,
            Source::Disc(disc) => serde_json::to_string(disc)?,
        };
        Ok(body)
    }

    fn from_stored(kind: &str, body: &str) -> Result<Self, CatalogError> {
        match SourceKind::parse(kind) {
            Some(SourceKind::File) => Ok(Source::File(serde_json::from_str(body)?)),
            Some(SourceKind::Disc) => Ok(Source::Disc(serde_json::from_str(body)?)),
            None => Err(unknown_kind(Self::TABLE, kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_body_round_trips_through_storage_format() {
        let source = Source::Disc(DiscSource {
            orig_dir_name: "MATRIX_DISC".into(),
            path: "/media/discs/matrix".into(),
            all_files_added: true,
        });
        let body = source.to_body().unwrap();
        assert!(body.contains(r#""origDirName":"MATRIX_DISC""#));
        assert_eq!(Source::from_stored("disc", &body).unwrap(), source);
    }

    #[test]
    fn test_unknown_source_kind() {
        assert!(matches!(
            Source::from_stored("stream", r#"{"path":"x"}"#),
            Err(CatalogError::UnknownKind { table: "sources", .. })
        ));
    }
}

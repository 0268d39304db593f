//! Request field validation
//!
//! JSON request bodies distinguish a field that was left out from one that was
//! sent as `null`. [`Field`] keeps that distinction through deserialization so
//! PUT and PATCH handlers can apply different rules to the same payload shape.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::CatalogError;

/// A request field: absent, explicitly `null`, or carrying a value.
///
/// Struct fields of this type must be marked `#[serde(default)]` so a missing
/// key deserializes as [`Field::Absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

impl<T> Field<T> {
    /// The value, treating absent and null alike
    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Absent | Field::Null => None,
        }
    }

    /// Apply to a nullable target: absent leaves it, null clears it, a value sets it
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Field::Absent => {}
            Field::Null => *target = None,
            Field::Value(value) => *target = Some(value),
        }
    }
}

fn invalid(name: &str, problem: &str) -> CatalogError {
    CatalogError::InvalidInput(format!("{}: {}", name, problem))
}

/// Field must be present and not null
pub fn required<T>(name: &str, field: Field<T>) -> Result<T, CatalogError> {
    match field {
        Field::Absent => Err(invalid(name, "is required")),
        Field::Null => Err(invalid(name, "cannot be null")),
        Field::Value(value) => Ok(value),
    }
}

/// Field may be absent but must not be null
pub fn not_null<T>(name: &str, field: Field<T>) -> Result<Option<T>, CatalogError> {
    match field {
        Field::Absent => Ok(None),
        Field::Null => Err(invalid(name, "cannot be null")),
        Field::Value(value) => Ok(Some(value)),
    }
}

/// Required, non-null, non-empty text
pub fn required_text(name: &str, field: Field<String>) -> Result<String, CatalogError> {
    let value = required(name, field)?;
    if value.is_empty() {
        return Err(invalid(name, "cannot be empty"));
    }
    Ok(value)
}

/// Optional text for a patch: absent means unchanged, null or empty is rejected
pub fn patch_text(name: &str, field: Field<String>) -> Result<Option<String>, CatalogError> {
    match not_null(name, field)? {
        Some(value) if value.is_empty() => Err(invalid(name, "cannot be empty")),
        other => Ok(other),
    }
}

/// Parse a non-nil UUID
pub fn parse_uuid(name: &str, text: &str) -> Result<Uuid, CatalogError> {
    let id = Uuid::parse_str(text).map_err(|_| invalid(name, "invalid UUID format"))?;
    if id.is_nil() {
        return Err(invalid(name, "cannot be empty"));
    }
    Ok(id)
}

/// Required, non-null, valid, non-nil UUID
pub fn required_uuid(name: &str, field: Field<String>) -> Result<Uuid, CatalogError> {
    let text = required(name, field)?;
    parse_uuid(name, &text)
}

/// Optional UUID for a patch: absent means unchanged, null is rejected
pub fn patch_uuid(name: &str, field: Field<String>) -> Result<Option<Uuid>, CatalogError> {
    not_null(name, field)?
        .map(|text| parse_uuid(name, &text))
        .transpose()
}

//! HTTP response building helpers
//!
//! Every handler answers with JSON; errors use `{"error": "<message>"}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::db::entities::UpsertOutcome;
use crate::error::CatalogError;

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Build a JSON response with 200 OK status
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

fn error_body(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    error_body(StatusCode::NOT_FOUND, message)
}

pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    error_body(StatusCode::BAD_REQUEST, message)
}

pub fn method_not_allowed() -> Response<Full<Bytes>> {
    error_body(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Status code of a PUT: 201 for a fresh row, 200 for an overwrite
pub fn upsert_status(outcome: UpsertOutcome) -> StatusCode {
    match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    }
}

/// Convert a CatalogError to an appropriate HTTP response
pub fn error_response(error: CatalogError) -> Response<Full<Bytes>> {
    let status = match &error {
        CatalogError::InvalidInput(_) | CatalogError::InvalidToken => StatusCode::BAD_REQUEST,
        CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        CatalogError::KindConflict { .. } => StatusCode::CONFLICT,
        // Includes foreign key failures from a plan naming a source or work
        // that does not exist; the catalog does not pre-check references.
        CatalogError::Storage(_)
        | CatalogError::Body(_)
        | CatalogError::UnknownKind { .. }
        | CatalogError::LockPoisoned
        | CatalogError::Io(_)
        | CatalogError::Config(_) => {
            error!(error = %error, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    error_body(status, &error.to_string())
}

/// Wrap a service result into an HTTP response
pub fn from_result<T: Serialize>(result: Result<T, CatalogError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => ok(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap an upsert result: 201 or 200 with an empty JSON object
pub fn from_upsert_result(result: Result<UpsertOutcome, CatalogError>) -> Response<Full<Bytes>> {
    match result {
        Ok(outcome) => json_response(upsert_status(outcome), &serde_json::json!({})),
        Err(e) => error_response(e),
    }
}

/// Wrap a patch result: 200 with an empty JSON object
pub fn from_patch_result(result: Result<(), CatalogError>) -> Response<Full<Bytes>> {
    match result {
        Ok(()) => ok(&serde_json::json!({})),
        Err(e) => error_response(e),
    }
}

//! Typed error handling for the catalog service
//!
//! The service distinguishes two failure classes:
//!
//! - [`CatalogError::NotFound`]: a lookup (possibly scoped by ancestor ids)
//!   matched no row. Surfaced as a 404 with a fixed per-kind body,
//!   `{"detail": "<kind> not found"}` — never a 5xx.
//! - [`CatalogError::Storage`]: a backend failure (connection loss,
//!   constraint violation). Not locally recoverable; surfaced as a 500 with
//!   an opaque body, the cause logged server-side.
//!
//! Malformed input (bad JSON shape, non-numeric path ids) is rejected by the
//! extractor layer before reaching the service and never produces a
//! `CatalogError`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::core::entity::EntityKind;

/// The error type returned by every catalog operation.
#[derive(Debug)]
pub enum CatalogError {
    /// No entity of this kind matched the requested id within its scope.
    NotFound(EntityKind),

    /// The storage backend failed.
    Storage(anyhow::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(kind) => write!(f, "{} not found", kind),
            CatalogError::Storage(err) => write!(f, "storage failure: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::NotFound(_) => None,
            CatalogError::Storage(err) => Some(&**err),
        }
    }
}

/// Wire body for error responses: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl CatalogError {
    /// The HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-visible detail message.
    ///
    /// NotFound carries the fixed per-kind message; storage failures are
    /// reported opaquely and logged server-side instead.
    pub fn detail(&self) -> String {
        match self {
            CatalogError::NotFound(kind) => format!("{} not found", kind),
            CatalogError::Storage(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        if let CatalogError::Storage(err) = &self {
            tracing::error!(error = %err, "storage failure");
        }

        let status = self.status_code();
        let body = Json(ErrorBody {
            detail: self.detail(),
        });
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        CatalogError::Storage(err)
    }
}

//! Error types for the artists service.
//!
//! [`ArtistError`] covers every way a request can fail and converts into an
//! Axum HTTP response via its [`IntoResponse`] implementation. Client errors
//! carry the JSON body the endpoint documents, a missing artist is a bare
//! `404`, and store failures surface as a generic `{"error", "status"}` body
//! without internal detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gostream_store::StoreError;

use crate::validation::{FieldError, PathError};

/// Errors that can occur while serving an artists request.
#[derive(Debug, thiserror::Error)]
pub enum ArtistError {
    /// The request body is not valid JSON for the endpoint.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// A body field failed validation.
    #[error("invalid field {}: {}", .0.field_ref, .0.error)]
    Validation(FieldError),

    /// A path parameter failed validation.
    #[error("invalid path parameter {}: {}", .0.path_ref, .0.error)]
    InvalidPath(PathError),

    /// No artist has the requested id.
    #[error("artist not found")]
    NotFound,

    /// An artist with the generated id already exists.
    #[error("artist already exists")]
    Conflict,

    /// The store call failed or was cancelled.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<FieldError> for ArtistError {
    fn from(err: FieldError) -> Self {
        Self::Validation(err)
    }
}

impl From<PathError> for ArtistError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath(err)
    }
}

impl ArtistError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::Validation(_) | Self::InvalidPath(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Store(e) if e.is_cancelled() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ArtistError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::InvalidBody(_) => (
                status,
                Json(serde_json::json!({ "message": "invalid request body" })),
            )
                .into_response(),
            Self::Validation(field) => (status, Json(field)).into_response(),
            Self::InvalidPath(path) => (status, Json(path)).into_response(),
            Self::Conflict => (
                status,
                Json(serde_json::json!({ "message": "artist already exists" })),
            )
                .into_response(),
            Self::NotFound => status.into_response(),
            Self::Store(e) if e.is_cancelled() => generic(status, "request cancelled"),
            Self::Store(_) => generic(status, "internal error"),
        }
    }
}

/// The `{"error", "status"}` body used when there is nothing more specific.
fn generic(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "error": message,
        "status": status.as_u16(),
    });
    (status, Json(body)).into_response()
}

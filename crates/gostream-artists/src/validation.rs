//! Request validation for the artists endpoints.
//!
//! Each check returns `Ok(())` or the first problem found. Field errors
//! serialize as `{"ref": .., "error": ..}`, path errors as
//! `{"pathRef": .., "error": ..}`.

use serde::Serialize;
use uuid::Uuid;

use crate::model::{CreateArtistRequest, UpdateArtistRequest};

/// A request body field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON field the error refers to.
    #[serde(rename = "ref")]
    pub field_ref: &'static str,
    /// What is wrong with it.
    pub error: &'static str,
}

/// A path parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathError {
    /// Route parameter the error refers to.
    #[serde(rename = "pathRef")]
    pub path_ref: &'static str,
    /// What is wrong with it.
    pub error: &'static str,
}

const EMPTY_NAME: FieldError = FieldError {
    field_ref: "name",
    error: "value must not be empty",
};

const EMPTY_GENRE: FieldError = FieldError {
    field_ref: "genres",
    error: "array value must not be empty",
};

const INVALID_ID: PathError = PathError {
    path_ref: ":id",
    error: "value is not a valid uuid",
};

/// Check a create body.
pub fn validate_create(body: &CreateArtistRequest) -> Result<(), FieldError> {
    check_name(&body.name)?;
    check_genres(&body.genres)
}

/// Check the fields an update body provides.
pub fn validate_update(body: &UpdateArtistRequest) -> Result<(), FieldError> {
    if let Some(name) = &body.name {
        check_name(name)?;
    }
    if let Some(genres) = &body.genres {
        check_genres(genres)?;
    }
    Ok(())
}

/// Check the `:id` route parameter is a UUID.
pub fn validate_id(id: &str) -> Result<Uuid, PathError> {
    Uuid::parse_str(id).ok().ok_or(INVALID_ID)
}

fn check_name(name: &str) -> Result<(), FieldError> {
    if name.trim().is_empty() {
        return Err(EMPTY_NAME);
    }
    Ok(())
}

fn check_genres(genres: &[String]) -> Result<(), FieldError> {
    if genres.iter().any(|genre| genre.trim().is_empty()) {
        return Err(EMPTY_GENRE);
    }
    Ok(())
}

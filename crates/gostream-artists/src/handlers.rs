//! REST endpoint handlers for the artists API.
//!
//! Handlers only extract the request, open a [`RequestContext`] and hand
//! off to [`ArtistService`](crate::service::ArtistService). Failures turn
//! into responses through [`ArtistError`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/artists` | List artists (`?name=` and `?limit=`) |
//! | `GET` | `/artists/{id}` | Get one artist |
//! | `POST` | `/artists` | Create an artist |
//! | `PUT` | `/artists/{id}` | Update the fields provided |
//! | `DELETE` | `/artists/{id}` | Delete an artist |
//!
//! [`RequestContext`]: gostream_store::RequestContext

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::error::ArtistError;
use crate::model::ListArtistsParams;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /artists
// ---------------------------------------------------------------------------

/// List artists, optionally filtered by exact name and capped by `limit`.
pub async fn list_artists(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListArtistsParams>,
) -> Result<impl IntoResponse, ArtistError> {
    let ctx = state.request_context();
    info!(request_id = %ctx.id(), method = "GET", path = "/artists", "handling request");

    let artists = state
        .artists
        .list(&ctx, params.name.as_deref(), params.limit())
        .await?;
    Ok(Json(artists))
}

// ---------------------------------------------------------------------------
// GET /artists/{id}
// ---------------------------------------------------------------------------

/// Return a single artist.
pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ArtistError> {
    let ctx = state.request_context();
    info!(request_id = %ctx.id(), method = "GET", path = "/artists/{id}", id, "handling request");

    let artist = state.artists.get(&ctx, &id).await?;
    Ok(Json(artist))
}

// ---------------------------------------------------------------------------
// POST /artists
// ---------------------------------------------------------------------------

/// Create an artist from a JSON body and return it with its new id.
pub async fn create_artist(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ArtistError> {
    let ctx = state.request_context();
    info!(request_id = %ctx.id(), method = "POST", path = "/artists", "handling request");

    let artist = state.artists.create(&ctx, &body).await?;
    Ok(Json(artist))
}

// ---------------------------------------------------------------------------
// PUT /artists/{id}
// ---------------------------------------------------------------------------

/// Change the fields present in the JSON body. Responds `204` on success.
pub async fn update_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ArtistError> {
    let ctx = state.request_context();
    info!(request_id = %ctx.id(), method = "PUT", path = "/artists/{id}", id, "handling request");

    state.artists.update(&ctx, &id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// DELETE /artists/{id}
// ---------------------------------------------------------------------------

/// Delete an artist. `202` when something was removed, `204` otherwise.
pub async fn delete_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ArtistError> {
    let ctx = state.request_context();
    info!(request_id = %ctx.id(), method = "DELETE", path = "/artists/{id}", id, "handling request");

    let deleted = state.artists.delete(&ctx, &id).await?;
    if deleted > 0 {
        Ok(StatusCode::ACCEPTED)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}

//! Axum router construction for the artists API.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the artists server.
///
/// - `GET /artists` -- list artists
/// - `POST /artists` -- create an artist
/// - `GET /artists/{id}` -- single artist
/// - `PUT /artists/{id}` -- update an artist
/// - `DELETE /artists/{id}` -- delete an artist
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/artists",
            get(handlers::list_artists).post(handlers::create_artist),
        )
        .route(
            "/artists/{id}",
            get(handlers::get_artist)
                .put(handlers::update_artist)
                .delete(handlers::delete_artist),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

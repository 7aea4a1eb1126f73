//! Shared application state for the artists API server.

use std::time::Duration;

use gostream_store::{Connection, RequestContext};

use crate::service::ArtistService;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Artist operations.
    pub artists: ArtistService,
    /// Deadline applied to the store calls of each request.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Serve artists stored in `database.collection` on `connection`, with
    /// no per-request deadline.
    pub fn new(connection: &Connection, database: &str, collection: &str) -> Self {
        Self {
            artists: ArtistService::new(connection, database, collection),
            request_timeout: None,
        }
    }

    /// Bound each request's store calls by `timeout`.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// A fresh context for one incoming request.
    pub fn request_context(&self) -> RequestContext {
        let ctx = RequestContext::new();
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}

//! Artists HTTP service for `gostream`.
//!
//! An Axum server exposing create, read, update and delete endpoints for
//! artist records kept in a `MongoDB` collection through
//! [`gostream_store`].
//!
//! # Architecture
//!
//! ```text
//! router --> handlers --> ArtistService --> Collection<ArtistInfo> --> Connection
//! ```
//!
//! Each request gets its own [`RequestContext`](gostream_store::RequestContext)
//! carrying a request id for logs and the configured store deadline.
//! Validation failures and store errors both come back as [`ArtistError`],
//! which renders the JSON error body for the endpoint.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod router;
pub mod server;
pub mod service;
pub mod state;
pub mod validation;

// Re-export primary types for convenience.
pub use config::{ConfigError, ServiceConfig};
pub use error::ArtistError;
pub use model::{ArtistInfo, ArtistStats};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use service::ArtistService;
pub use state::AppState;

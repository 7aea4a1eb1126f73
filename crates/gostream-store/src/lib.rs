//! Typed document-store access for `gostream` services.
//!
//! Callers describe *which* documents they want with a [`Predicate`] tree
//! and *how* to change them with a [`Mutation`] tree. Both are plain data;
//! [`translate`] lowers them to native `MongoDB` filter and update
//! documents, and a [`Collection<T>`] runs those against whatever backend
//! the [`Connection`] holds.
//!
//! # Architecture
//!
//! ```text
//! Collection<T>::find / update / ...
//!     |
//!     +-- Predicate / Mutation ---> translate ---> native Document
//!     |
//!     +-- RequestContext::guard (deadline + cancel signal)
//!     |
//!     +-- Connection ---> dyn DocumentBackend
//!                             |-- MongoBackend     (live deployment)
//!                             +-- InMemoryBackend  (tests, local dev)
//! ```
//!
//! # Modules
//!
//! - [`predicate`] -- Match conditions (`Eq`, `In`, `And`, `Or`)
//! - [`mutation`] -- Field changes (`Set`, `Increment`, `Batch`)
//! - [`envelope`] -- [`Query`] and [`Update`] wrappers
//! - [`translate`] -- Lowering to native documents
//! - [`collection`] -- Typed create/find/update/delete
//! - [`connection`] -- Shared backend handle
//! - [`context`] -- Request id, deadline, and cancellation
//! - [`backend`] -- The native-operation trait
//! - [`mongo`] -- `MongoDB` backend and configuration
//! - [`memory`] -- In-process backend
//! - [`error`] -- Shared error type

pub mod backend;
pub mod collection;
pub mod connection;
pub mod context;
pub mod envelope;
pub mod error;
mod eval;
pub mod memory;
pub mod mongo;
pub mod mutation;
pub mod predicate;
pub mod translate;

// Re-export primary types for convenience.
pub use backend::{DocumentBackend, Namespace};
pub use collection::{Collection, Entity, PRIMARY_KEY};
pub use connection::Connection;
pub use context::{CancelSignal, RequestContext};
pub use envelope::{Query, Update};
pub use error::{CancelCause, StoreError};
pub use memory::InMemoryBackend;
pub use mongo::{MongoBackend, MongoConfig};
pub use mutation::Mutation;
pub use predicate::Predicate;

/// The BSON crate this library builds documents with.
pub use mongodb::bson;

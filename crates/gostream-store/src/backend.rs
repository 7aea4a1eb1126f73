//! The native-operation seam between collections and a concrete store.
//!
//! A [`DocumentBackend`] speaks only native documents: it never sees
//! predicate trees or entity types. [`crate::mongo::MongoBackend`] forwards
//! to a `MongoDB` deployment; [`crate::memory::InMemoryBackend`] evaluates the
//! same documents in process for tests and local development.
//!
//! Implementations must be safe to call from many tasks at once without
//! external locking.

use std::fmt;

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::StoreError;

/// A `(database, collection)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
}

impl Namespace {
    /// Create a namespace.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Native document operations, one request/response exchange each.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Insert one document.
    ///
    /// Fails with [`StoreError::DuplicateKey`] when a document with the
    /// same `_id` exists.
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> Result<(), StoreError>;

    /// Return documents matching `filter`, at most `limit` of them (`0` is
    /// unrestricted).
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError>;

    /// Apply `update` to every document matching `filter` and return how
    /// many were actually modified.
    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<u64, StoreError>;

    /// Delete the first document matching `filter` and return how many were
    /// removed (`0` or `1`).
    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> Result<u64, StoreError>;
}

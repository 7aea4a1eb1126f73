//! Typed access to one named collection.
//!
//! [`Collection<T>`] turns entity values into native documents on the way
//! in and back on the way out, lowers [`Query`] and [`Update`] envelopes,
//! and hands the result to the connection's backend under the request's
//! deadline and cancellation signal. It keeps no state between calls.
//!
//! # Identifier mapping
//!
//! The store keys every document by `_id`. Entities name their identifier
//! through [`Entity::ID_FIELD`]; on create that field is moved to `_id`
//! (placed first), on read `_id` is moved back before decoding.

use std::marker::PhantomData;

use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::Namespace;
use crate::connection::Connection;
use crate::context::RequestContext;
use crate::envelope::{Query, Update};
use crate::error::StoreError;

/// Primary-key field name used by the store.
pub const PRIMARY_KEY: &str = "_id";

/// A type stored as one document per value.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Serialized field holding the identifier. Mapped to `_id` in storage.
    const ID_FIELD: &'static str = "id";
}

/// Typed accessor for one `(database, collection)` pair.
pub struct Collection<T> {
    connection: Connection,
    namespace: Namespace,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            namespace: self.namespace.clone(),
            entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> Collection<T> {
    /// Bind a collection on `connection`.
    pub fn new(connection: &Connection, database: &str, collection: &str) -> Self {
        Self {
            connection: connection.clone(),
            namespace: Namespace::new(database, collection),
            entity: PhantomData,
        }
    }

    /// The `(database, collection)` this accessor targets.
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Persist `entity` as one new document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if a document with the same
    /// identifier exists, [`StoreError::MissingId`] if the entity serializes
    /// without one, and [`StoreError::Encode`] if it cannot be serialized.
    pub async fn create(&self, ctx: &RequestContext, entity: &T) -> Result<(), StoreError> {
        let document = to_native(entity)?;
        tracing::debug!(
            request_id = %ctx.id(),
            database = %self.namespace.database,
            collection = %self.namespace.collection,
            id = ?document.get(PRIMARY_KEY),
            "create"
        );

        ctx.guard(
            self.connection
                .backend()
                .insert_one(&self.namespace, document),
        )
        .await
    }

    /// Return every entity matching `query`, capped by its limit.
    ///
    /// Nothing matching is an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for a malformed predicate key and
    /// [`StoreError::Decode`] if a stored document does not fit `T`.
    pub async fn find(&self, ctx: &RequestContext, query: &Query) -> Result<Vec<T>, StoreError> {
        if let Some(root) = &query.root {
            root.validate()?;
        }
        let filter = query.filter();
        tracing::debug!(
            request_id = %ctx.id(),
            database = %self.namespace.database,
            collection = %self.namespace.collection,
            limit = query.limit,
            %filter,
            "find"
        );

        let documents = ctx
            .guard(
                self.connection
                    .backend()
                    .find(&self.namespace, filter, query.limit),
            )
            .await?;

        tracing::debug!(request_id = %ctx.id(), found = documents.len(), "find complete");
        documents.into_iter().map(from_native).collect()
    }

    /// Return the first entity matching `query`, if any.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::find`].
    pub async fn find_one(&self, ctx: &RequestContext, query: &Query) -> Result<Option<T>, StoreError> {
        let query = Query {
            root: query.root.clone(),
            limit: 1,
        };
        Ok(self.find(ctx, &query).await?.into_iter().next())
    }

    /// Apply `update` to every document matching `query.root` and return
    /// how many changed.
    ///
    /// `query.limit` is not honoured: every match is updated. An update that
    /// can never change anything returns `0` without contacting the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for a malformed key in either tree
    /// and [`StoreError::Rejected`] if the store refuses the update.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        query: &Query,
        update: &Update,
    ) -> Result<u64, StoreError> {
        if let Some(root) = &query.root {
            root.validate()?;
        }
        update.root.validate()?;

        if query.limit != 0 {
            tracing::debug!(
                request_id = %ctx.id(),
                limit = query.limit,
                "update ignores query limit"
            );
        }
        if update.is_noop() {
            tracing::debug!(request_id = %ctx.id(), "update has no changes, skipping");
            return Ok(0);
        }

        let filter = query.filter();
        let document = update.document();
        tracing::debug!(
            request_id = %ctx.id(),
            database = %self.namespace.database,
            collection = %self.namespace.collection,
            %filter,
            update = %document,
            "update"
        );

        let modified = ctx
            .guard(
                self.connection
                    .backend()
                    .update_many(&self.namespace, filter, document),
            )
            .await?;

        tracing::debug!(request_id = %ctx.id(), modified, "update complete");
        Ok(modified)
    }

    /// Remove the document whose identifier is `id`. Returns `0` if there
    /// was none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store call fails.
    pub async fn delete(&self, ctx: &RequestContext, id: impl Into<Bson>) -> Result<u64, StoreError> {
        let filter = Query::by_id(id).filter();
        tracing::debug!(
            request_id = %ctx.id(),
            database = %self.namespace.database,
            collection = %self.namespace.collection,
            %filter,
            "delete"
        );

        let deleted = ctx
            .guard(
                self.connection
                    .backend()
                    .delete_one(&self.namespace, filter),
            )
            .await?;

        tracing::debug!(request_id = %ctx.id(), deleted, "delete complete");
        Ok(deleted)
    }
}

/// Serialize an entity and move its identifier to a leading `_id`.
fn to_native<T: Entity>(entity: &T) -> Result<Document, StoreError> {
    let mut document = bson::to_document(entity)?;
    let missing = StoreError::MissingId {
        field: T::ID_FIELD,
    };

    if T::ID_FIELD == PRIMARY_KEY {
        return match document.get(PRIMARY_KEY) {
            None | Some(Bson::Null) => Err(missing),
            Some(_) => Ok(document),
        };
    }

    let id = match document.remove(T::ID_FIELD) {
        None | Some(Bson::Null) => return Err(missing),
        Some(id) => id,
    };
    let mut native = Document::new();
    native.insert(PRIMARY_KEY, id);
    native.extend(document);
    Ok(native)
}

/// Move `_id` back to the entity's identifier field and decode.
fn from_native<T: Entity>(mut document: Document) -> Result<T, StoreError> {
    if T::ID_FIELD != PRIMARY_KEY {
        if let Some(id) = document.remove(PRIMARY_KEY) {
            document.insert(T::ID_FIELD, id);
        }
    }
    Ok(bson::from_document(document)?)
}

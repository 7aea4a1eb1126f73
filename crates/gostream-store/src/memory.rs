//! In-process backend for tests and local development.
//!
//! Documents live in a `HashMap` keyed by [`Namespace`], one `Vec` per
//! collection in insertion order. Filters and updates go through the same
//! native documents a live deployment would receive, evaluated by
//! [`crate::eval`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use tokio::sync::RwLock;

use crate::backend::{DocumentBackend, Namespace};
use crate::error::StoreError;
use crate::eval;

/// Primary-key field every stored document carries.
const ID: &str = "_id";

/// Thread-safe in-memory document store.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    collections: Arc<RwLock<HashMap<Namespace, Vec<Document>>>>,
}

impl InMemoryBackend {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `namespace`.
    pub async fn document_count(&self, namespace: &Namespace) -> usize {
        self.collections
            .read()
            .await
            .get(namespace)
            .map_or(0, Vec::len)
    }

    /// Drop every stored document in every namespace.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

/// Put `_id` first, generating an `ObjectId` when the caller left it out.
fn with_leading_id(mut document: Document) -> Document {
    let id = document
        .remove(ID)
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
    let mut ordered = Document::new();
    ordered.insert(ID, id);
    ordered.extend(document);
    ordered
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn insert_one(&self, namespace: &Namespace, document: Document) -> Result<(), StoreError> {
        let document = with_leading_id(document);
        let mut collections = self.collections.write().await;
        let documents = collections.entry(namespace.clone()).or_default();

        if let Some(id) = document.get(ID) {
            let taken = documents
                .iter()
                .filter_map(|existing| existing.get(ID))
                .any(|existing| eval::values_equal(existing, id));
            if taken {
                return Err(StoreError::DuplicateKey(format!(
                    "collection: {namespace} dup key: {{ _id: {id} }}"
                )));
            }
        }

        documents.push(document);
        Ok(())
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(namespace) else {
            return Ok(Vec::new());
        };

        let cap = match limit {
            0 => usize::MAX,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        let mut found = Vec::new();
        for document in documents {
            if found.len() >= cap {
                break;
            }
            if eval::matches(document, &filter)? {
                found.push(document.clone());
            }
        }
        Ok(found)
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
    ) -> Result<u64, StoreError> {
        eval::check_update(&update)?;

        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(namespace) else {
            return Ok(0);
        };

        // Stage every replacement first so a failure part-way leaves the
        // collection untouched.
        let mut staged = Vec::with_capacity(documents.len());
        for document in documents.iter() {
            let mut replacement = None;
            if eval::matches(document, &filter)? {
                let mut candidate = document.clone();
                if eval::apply_update(&mut candidate, &update)? {
                    replacement = Some(candidate);
                }
            }
            staged.push(replacement);
        }

        let mut modified = 0_u64;
        for (slot, replacement) in documents.iter_mut().zip(staged) {
            if let Some(replacement) = replacement {
                *slot = replacement;
                modified = modified.saturating_add(1);
            }
        }
        Ok(modified)
    }

    async fn delete_one(&self, namespace: &Namespace, filter: Document) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(namespace) else {
            return Ok(0);
        };

        let mut position = None;
        for (index, document) in documents.iter().enumerate() {
            if eval::matches(document, &filter)? {
                position = Some(index);
                break;
            }
        }

        Ok(position.map_or(0, |index| {
            documents.remove(index);
            1
        }))
    }
}

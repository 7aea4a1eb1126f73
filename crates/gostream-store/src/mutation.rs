//! Mutation algebra: composable descriptions of field changes.
//!
//! Like [`crate::predicate`], this is pure data. Assignments are kept in a
//! [`Document`] so the caller's key order (and dotted paths for nested
//! fields) reach the store verbatim.

use mongodb::bson::{Bson, Document};

use crate::error::StoreError;
use crate::predicate::validate_key;

/// A change to apply to every matched document.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Overwrite each named field with its new value. Fields not mentioned
    /// are left untouched. An empty assignment set changes nothing.
    Set(Document),
    /// Add each numeric delta to the named field, creating it when absent.
    Increment(Document),
    /// Apply several mutations in one atomic update.
    Batch(Vec<Self>),
}

impl Mutation {
    /// Start an empty field-set.
    pub fn set() -> Self {
        Self::Set(Document::new())
    }

    /// Field-set of a single assignment.
    pub fn set_field(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        let mut assignments = Document::new();
        assignments.insert(path.into(), value.into());
        Self::Set(assignments)
    }

    /// Numeric increment of a single field.
    pub fn increment(path: impl Into<String>, delta: impl Into<Bson>) -> Self {
        let mut deltas = Document::new();
        deltas.insert(path.into(), delta.into());
        Self::Increment(deltas)
    }

    /// Add an assignment to a field-set.
    ///
    /// On any other node kind the assignment is appended as a new field-set
    /// inside a batch.
    #[must_use]
    pub fn with(self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        match self {
            Self::Set(mut assignments) => {
                assignments.insert(path.into(), value.into());
                Self::Set(assignments)
            }
            Self::Batch(mut children) => {
                children.push(Self::set_field(path, value));
                Self::Batch(children)
            }
            node @ Self::Increment(_) => Self::Batch(vec![node, Self::set_field(path, value)]),
        }
    }

    /// Whether applying this mutation can never change a document.
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Set(fields) | Self::Increment(fields) => fields.is_empty(),
            Self::Batch(children) => children.iter().all(Self::is_noop),
        }
    }

    /// Check every field path in the tree is a well-formed dot-path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for the first malformed path.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            Self::Set(fields) | Self::Increment(fields) => {
                fields.keys().try_for_each(|key| validate_key(key))
            }
            Self::Batch(children) => children.iter().try_for_each(Self::validate),
        }
    }
}

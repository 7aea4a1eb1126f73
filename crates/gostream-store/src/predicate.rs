//! Predicate algebra: composable descriptions of which documents match.
//!
//! A [`Predicate`] is pure data. It holds no connection state and performs
//! no I/O; turning it into something the store understands is the job of
//! [`crate::translate`]. New condition kinds are added as new variants, and
//! every `match` over the enum (translator, in-memory evaluator) has to
//! handle them before the crate compiles again.

use mongodb::bson::Bson;

use crate::error::StoreError;

/// A query condition over stored documents.
///
/// Keys are dot-paths (`"stats.popularity"`) naming a field, possibly
/// nested. Values are passed through to the store unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The field at `key` equals `value`.
    Eq {
        /// Dot-path of the field to compare.
        key: String,
        /// Value the field must equal.
        value: Bson,
    },
    /// The field at `key` equals any of `values`.
    In {
        /// Dot-path of the field to compare.
        key: String,
        /// Accepted values.
        values: Vec<Bson>,
    },
    /// Every child matches. Zero children matches every document.
    And(Vec<Self>),
    /// At least one child matches. Zero children matches nothing.
    Or(Vec<Self>),
}

impl Predicate {
    /// Field equality.
    pub fn eq(key: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Field membership in a set of values.
    pub fn is_in<V: Into<Bson>>(key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of `children`.
    pub const fn and(children: Vec<Self>) -> Self {
        Self::And(children)
    }

    /// Disjunction of `children`.
    pub const fn or(children: Vec<Self>) -> Self {
        Self::Or(children)
    }

    /// The identity predicate: an empty conjunction.
    pub const fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Whether this node is the identity predicate.
    pub const fn is_match_all(&self) -> bool {
        matches!(self, Self::And(children) if children.is_empty())
    }

    /// Append `other` to this predicate as a conjunct.
    ///
    /// An existing conjunction grows in place; any other node is wrapped
    /// together with `other` in a new conjunction.
    #[must_use]
    pub fn and_also(self, other: Self) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            node => Self::And(vec![node, other]),
        }
    }

    /// Check every key in the tree is a well-formed dot-path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] for the first key that is empty,
    /// contains an empty segment (`"a..b"`, `".a"`, `"a."`) or has a segment
    /// starting with `$`, which the store would read as an operator.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            Self::Eq { key, .. } | Self::In { key, .. } => validate_key(key),
            Self::And(children) | Self::Or(children) => {
                children.iter().try_for_each(Self::validate)
            }
        }
    }
}

/// Check a single dot-path key.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if key
        .split('.')
        .any(|segment| segment.is_empty() || segment.starts_with('$'))
    {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

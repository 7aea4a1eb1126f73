//! Error types for the store layer.
//!
//! All failures surface through [`StoreError`], tagged by kind. The layer
//! performs no local recovery: nothing is retried and nothing is rolled
//! back, so callers see every failure exactly as it happened.
//!
//! "Nothing matched" is never an error here. It shows up as an empty result
//! vector from `find` or a zero count from `update` / `delete`.

use std::fmt;

/// Errors that can occur in the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport or handshake failure talking to the backing store.
    #[error("connection error: {0}")]
    Connection(String),

    /// A native result document could not be mapped into the entity type.
    #[error("decode error: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    /// An entity could not be serialized into a native document.
    #[error("encode error: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    /// A create violated the primary-key uniqueness constraint.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The entity serialized without its identifier field.
    #[error("entity has no value for identifier field `{field}`")]
    MissingId {
        /// Name of the identifier field the entity declares.
        field: &'static str,
    },

    /// A predicate or mutation key is empty or has an empty path segment.
    #[error("invalid field key: {0:?}")]
    InvalidKey(String),

    /// The store understood the request and refused to apply it.
    #[error("request rejected by store: {0}")]
    Rejected(String),

    /// The operation's deadline or cancellation signal fired first.
    #[error("operation cancelled: {0}")]
    Cancelled(CancelCause),

    /// Connection configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error is a primary-key collision.
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }

    /// Whether this error came from a deadline or cancellation signal.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        let message = err.to_string();
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
                Self::DuplicateKey(write.message.clone())
            }
            ErrorKind::Command(command) if command.code == DUPLICATE_KEY_CODE => {
                Self::DuplicateKey(command.message.clone())
            }
            ErrorKind::BsonDeserialization(e) => Self::Decode(e.clone()),
            ErrorKind::BsonSerialization(e) => Self::Encode(e.clone()),
            ErrorKind::Write(_) | ErrorKind::Command(_) | ErrorKind::InvalidArgument { .. } => {
                Self::Rejected(message)
            }
            _ => Self::Connection(message),
        }
    }
}

/// What stopped a cancelled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// The request deadline passed.
    Deadline,
    /// The request's cancellation signal was triggered.
    Signal,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadline => f.write_str("deadline exceeded"),
            Self::Signal => f.write_str("cancellation requested"),
        }
    }
}

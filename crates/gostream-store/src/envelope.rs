//! Query and update envelopes: a tree plus its execution modifiers.

use mongodb::bson::Document;

use crate::mutation::Mutation;
use crate::predicate::Predicate;
use crate::translate;

/// A predicate tree plus a result limit.
///
/// An absent `root` matches every document. A `limit` of `0` means no
/// cap; any other value returns at most that many documents in the
/// store's default order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Match condition. `None` matches everything.
    pub root: Option<Predicate>,
    /// Maximum number of documents to return. `0` is unrestricted.
    pub limit: u32,
}

impl Query {
    /// Match every document, no limit.
    pub const fn all() -> Self {
        Self {
            root: None,
            limit: 0,
        }
    }

    /// Match documents satisfying `predicate`, no limit.
    pub const fn matching(predicate: Predicate) -> Self {
        Self {
            root: Some(predicate),
            limit: 0,
        }
    }

    /// Match the document whose primary key equals `id`.
    pub fn by_id(id: impl Into<mongodb::bson::Bson>) -> Self {
        Self::matching(Predicate::eq("_id", id)).with_limit(1)
    }

    /// Set the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Lower the root predicate to a native filter document.
    pub fn filter(&self) -> Document {
        self.root
            .as_ref()
            .map_or_else(Document::new, translate::lower_predicate)
    }
}

/// A mutation tree to apply to matched documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// The change to apply.
    pub root: Mutation,
}

impl Update {
    /// Wrap a mutation.
    pub const fn new(root: Mutation) -> Self {
        Self { root }
    }

    /// Whether the update can never modify a document.
    pub fn is_noop(&self) -> bool {
        self.root.is_noop()
    }

    /// Lower the mutation to a native update document.
    pub fn document(&self) -> Document {
        translate::lower_mutation(&self.root)
    }
}

impl From<Mutation> for Update {
    fn from(root: Mutation) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn absent_root_is_match_all() {
        assert_eq!(Query::all().filter(), Document::new());
        assert_eq!(Query::default().filter(), Document::new());
    }

    #[test]
    fn by_id_limits_to_one() {
        let q = Query::by_id("a1");
        assert_eq!(q.limit, 1);
        assert_eq!(q.filter(), doc! { "_id": "a1" });
    }

    #[test]
    fn update_document_wraps_set() {
        let u = Update::from(Mutation::set_field("followers", 20_i32));
        assert!(!u.is_noop());
        assert_eq!(u.document(), doc! { "$set": { "followers": 20 } });
    }
}

//! Lowering of predicate and mutation trees into native store documents.
//!
//! Both functions are pure and total over the closed node sets. They never
//! look inside the values they carry; whatever `Bson` the caller put in a
//! node comes out unchanged in the native document.
//!
//! | Node | Native form |
//! |------|-------------|
//! | `Eq { k, v }` | `{ k: v }` |
//! | `In { k, vs }` | `{ k: { "$in": vs } }` |
//! | `And([])` | `{}` |
//! | `And([c])` | `lower(c)` |
//! | `And([c1, c2, ..])` | `{ "$and": [lower(c1), lower(c2), ..] }` |
//! | `Or([])` | `{ "$nor": [{}] }` |
//! | `Or([c])` | `lower(c)` |
//! | `Or([c1, c2, ..])` | `{ "$or": [lower(c1), lower(c2), ..] }` |
//! | `Set(m)` | `{ "$set": m }` |
//! | `Increment(m)` | `{ "$inc": m }` |
//! | `Batch([..])` | operator documents of the children, merged |

use mongodb::bson::{Bson, Document};

use crate::mutation::Mutation;
use crate::predicate::Predicate;

/// Logical AND combinator.
pub const AND: &str = "$and";
/// Logical OR combinator.
pub const OR: &str = "$or";
/// Logical NOR combinator.
pub const NOR: &str = "$nor";
/// Set-membership operator.
pub const IN: &str = "$in";
/// Field assignment operator.
pub const SET: &str = "$set";
/// Numeric increment operator.
pub const INC: &str = "$inc";

/// Lower a predicate tree to a native filter document.
pub fn lower_predicate(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::Eq { key, value } => single(key, value.clone()),
        Predicate::In { key, values } => {
            single(key, Bson::Document(single(IN, Bson::Array(values.clone()))))
        }
        Predicate::And(children) => match children.as_slice() {
            [] => Document::new(),
            [only] => lower_predicate(only),
            many => single(AND, lower_all(many)),
        },
        Predicate::Or(children) => match children.as_slice() {
            // NOR over the match-all filter: the native spelling of "nothing".
            [] => single(NOR, Bson::Array(vec![Bson::Document(Document::new())])),
            [only] => lower_predicate(only),
            many => single(OR, lower_all(many)),
        },
    }
}

/// Lower a mutation tree to a native update document.
pub fn lower_mutation(mutation: &Mutation) -> Document {
    let mut update = Document::new();
    lower_into(mutation, &mut update);
    update
}

fn lower_into(mutation: &Mutation, update: &mut Document) {
    match mutation {
        Mutation::Set(assignments) => merge_operator(update, SET, assignments),
        Mutation::Increment(deltas) => merge_operator(update, INC, deltas),
        Mutation::Batch(children) => {
            for child in children.iter().filter(|child| !child.is_noop()) {
                lower_into(child, update);
            }
        }
    }
}

/// Merge `fields` under `operator`, later keys overwriting earlier ones.
fn merge_operator(update: &mut Document, operator: &str, fields: &Document) {
    if let Some(Bson::Document(existing)) = update.get_mut(operator) {
        for (key, value) in fields {
            existing.insert(key.clone(), value.clone());
        }
        return;
    }
    update.insert(operator, fields.clone());
}

fn lower_all(children: &[Predicate]) -> Bson {
    Bson::Array(
        children
            .iter()
            .map(|child| Bson::Document(lower_predicate(child)))
            .collect(),
    )
}

fn single(key: &str, value: Bson) -> Document {
    let mut document = Document::new();
    document.insert(key, value);
    document
}

//! In-process evaluation of native filter and update documents.
//!
//! Used by [`crate::memory::InMemoryBackend`]. Covers the native forms the
//! translator emits plus the handful of neighbouring operators callers are
//! likely to hand-write:
//!
//! - filters: literal equality, `$eq`, `$ne`, `$in`, `$and`, `$or`, `$nor`
//! - updates: `$set`, `$inc`
//!
//! Equality follows document-store rules rather than `Bson`'s `PartialEq`:
//! numbers compare by value across int32/int64/double, an array field
//! matches when any element equals the operand, and `null` matches a
//! missing field. Anything else is refused with [`StoreError::Rejected`].

use std::cmp::Ordering;

use mongodb::bson::{Bson, Document};

use crate::error::StoreError;
use crate::translate::{AND, IN, INC, NOR, OR, SET};

/// Equality operator.
const EQ: &str = "$eq";
/// Inequality operator.
const NE: &str = "$ne";
/// Reserved primary-key field.
const ID: &str = "_id";

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Whether `document` satisfies every clause of `filter`.
pub(crate) fn matches(document: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, condition) in filter {
        let satisfied = if key.starts_with('$') {
            match_logical(document, key, condition)?
        } else {
            match_field(document, key, condition)?
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn match_logical(document: &Document, operator: &str, operand: &Bson) -> Result<bool, StoreError> {
    if !matches!(operator, AND | OR | NOR) {
        return Err(StoreError::Rejected(format!(
            "unknown top level operator: {operator}"
        )));
    }

    let clauses = clause_list(operator, operand)?;
    for clause in clauses {
        let hit = matches(document, clause)?;
        match operator {
            AND if !hit => return Ok(false),
            OR if hit => return Ok(true),
            NOR if hit => return Ok(false),
            _ => {}
        }
    }
    // Exhausted: AND and NOR held for every clause, OR found no hit.
    Ok(operator != OR)
}

fn clause_list<'a>(operator: &str, operand: &'a Bson) -> Result<Vec<&'a Document>, StoreError> {
    let Bson::Array(items) = operand else {
        return Err(StoreError::Rejected(format!("{operator} must be an array")));
    };
    if items.is_empty() {
        return Err(StoreError::Rejected(format!(
            "{operator} must be a nonempty array"
        )));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            other => Err(StoreError::Rejected(format!(
                "{operator} argument's entries must be objects, got {other}"
            ))),
        })
        .collect()
}

fn match_field(document: &Document, path: &str, condition: &Bson) -> Result<bool, StoreError> {
    let values = resolve(document, path);

    let Bson::Document(operators) = condition else {
        return Ok(any_equal(&values, condition));
    };
    if !is_operator_document(operators) {
        return Ok(any_equal(&values, condition));
    }

    for (operator, operand) in operators {
        let satisfied = match operator.as_str() {
            EQ => any_equal(&values, operand),
            NE => !any_equal(&values, operand),
            IN => {
                let Bson::Array(options) = operand else {
                    return Err(StoreError::Rejected(String::from("$in needs an array")));
                };
                options.iter().any(|option| any_equal(&values, option))
            }
            other => {
                return Err(StoreError::Rejected(format!("unknown operator: {other}")));
            }
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_operator_document(document: &Document) -> bool {
    document.keys().next().is_some_and(|key| key.starts_with('$'))
}

/// Collect every value reachable at `path`, descending into nested
/// documents and fanning out across arrays of documents.
fn resolve<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let mut segments = path.split('.');
    let mut current: Vec<&Bson> = segments
        .next()
        .and_then(|first| document.get(first))
        .into_iter()
        .collect();

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Bson::Document(child) => next.extend(child.get(segment)),
                Bson::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(items.iter().filter_map(|item| match item {
                        Bson::Document(child) => child.get(segment),
                        _ => None,
                    })),
                },
                _ => {}
            }
        }
        current = next;
    }
    current
}

fn any_equal(values: &[&Bson], target: &Bson) -> bool {
    if values.is_empty() {
        return matches!(target, Bson::Null);
    }
    values.iter().any(|value| {
        values_equal(value, target)
            || matches!(value, Bson::Array(items) if items.iter().any(|item| values_equal(item, target)))
    })
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Bson) -> Option<Number> {
    match value {
        Bson::Int32(n) => Some(Number::Int(i64::from(*n))),
        Bson::Int64(n) => Some(Number::Int(*n)),
        Bson::Double(n) => Some(Number::Float(*n)),
        _ => None,
    }
}

/// 2^63, the first double above `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn numbers_equal(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x == y,
        (Number::Int(x), Number::Float(y)) | (Number::Float(y), Number::Int(x)) => {
            int_equals_float(x, y)
        }
        (Number::Float(x), Number::Float(y)) => x.partial_cmp(&y) == Some(Ordering::Equal),
    }
}

/// Exact comparison: `y` must be a whole number in `i64` range whose value
/// is `x`. Never rounds `x` to the nearest double.
#[allow(clippy::cast_possible_truncation)]
fn int_equals_float(x: i64, y: f64) -> bool {
    if y.trunc().partial_cmp(&y) != Some(Ordering::Equal) || !(-I64_LIMIT..I64_LIMIT).contains(&y) {
        return false;
    }
    y as i64 == x
}

/// Store equality: numeric by value, containers element-wise.
pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return numbers_equal(x, y);
    }
    match (a, b) {
        (Bson::Array(xs), Bson::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Bson::Document(xs), Bson::Document(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((kx, vx), (ky, vy))| kx == ky && values_equal(vx, vy))
        }
        _ => a == b,
    }
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Check `update` is a well-formed operator document before touching any
/// stored document.
pub(crate) fn check_update(update: &Document) -> Result<(), StoreError> {
    if update.is_empty() {
        return Err(StoreError::Rejected(String::from(
            "update document requires atomic operators",
        )));
    }
    for (operator, operand) in update {
        if !matches!(operator.as_str(), SET | INC) {
            return Err(StoreError::Rejected(format!(
                "unknown modifier: {operator}"
            )));
        }
        if !matches!(operand, Bson::Document(_)) {
            return Err(StoreError::Rejected(format!(
                "modifiers operate on fields but {operator} got {operand}"
            )));
        }
    }
    Ok(())
}

/// Apply a checked update document in place. Returns whether the document
/// content changed.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> Result<bool, StoreError> {
    let mut changed = false;
    for (operator, operand) in update {
        let Bson::Document(fields) = operand else {
            continue;
        };
        for (path, value) in fields {
            if path == ID || path.starts_with("_id.") {
                guard_id(document, operator, path, value)?;
                continue;
            }
            let field_changed = match operator.as_str() {
                SET => set_path(document, path, value.clone())?,
                INC => increment_path(document, path, value)?,
                other => {
                    return Err(StoreError::Rejected(format!("unknown modifier: {other}")));
                }
            };
            changed = changed || field_changed;
        }
    }
    Ok(changed)
}

/// Only a `$set` of `_id` to its current value is accepted.
fn guard_id(document: &Document, operator: &str, path: &str, value: &Bson) -> Result<(), StoreError> {
    let unchanged = operator == SET
        && resolve(document, path)
            .first()
            .is_some_and(|current| *current == value);
    if unchanged {
        Ok(())
    } else {
        Err(StoreError::Rejected(String::from(
            "performing an update on the path '_id' would modify the immutable field '_id'",
        )))
    }
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> Result<bool, StoreError> {
    match path.split_once('.') {
        None => {
            let changed = document.get(path) != Some(&value);
            document.insert(path, value);
            Ok(changed)
        }
        Some((head, rest)) => match child_document(document, head, rest)? {
            Some(child) => set_path(child, rest, value),
            None => {
                let mut child = Document::new();
                set_path(&mut child, rest, value)?;
                document.insert(head, child);
                Ok(true)
            }
        },
    }
}

fn increment_path(document: &mut Document, path: &str, delta: &Bson) -> Result<bool, StoreError> {
    if as_number(delta).is_none() {
        return Err(StoreError::Rejected(format!(
            "cannot increment with non-numeric argument: {{{path}: {delta}}}"
        )));
    }
    match path.split_once('.') {
        None => {
            let Some(current) = document.get(path) else {
                document.insert(path, delta.clone());
                return Ok(true);
            };
            let next = add_numbers(path, current, delta)?;
            let changed = *current != next;
            document.insert(path, next);
            Ok(changed)
        }
        Some((head, rest)) => match child_document(document, head, rest)? {
            Some(child) => increment_path(child, rest, delta),
            None => {
                let mut child = Document::new();
                increment_path(&mut child, rest, delta)?;
                document.insert(head, child);
                Ok(true)
            }
        },
    }
}

/// The embedded document at `head`, `None` when the field is absent.
fn child_document<'a>(
    document: &'a mut Document,
    head: &str,
    rest: &str,
) -> Result<Option<&'a mut Document>, StoreError> {
    match document.get_mut(head) {
        None => Ok(None),
        Some(Bson::Document(child)) => Ok(Some(child)),
        Some(other) => Err(StoreError::Rejected(format!(
            "cannot create field '{rest}' in element {{{head}: {other}}}"
        ))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn add_numbers(path: &str, current: &Bson, delta: &Bson) -> Result<Bson, StoreError> {
    let (Some(a), Some(b)) = (as_number(current), as_number(delta)) else {
        return Err(StoreError::Rejected(format!(
            "cannot apply $inc to a value of non-numeric type: {{{path}: {current}}}"
        )));
    };
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => {
            let sum = x.checked_add(y).ok_or_else(|| {
                StoreError::Rejected(format!("integer overflow incrementing '{path}'"))
            })?;
            // int32 + int32 stays int32 until it no longer fits.
            let narrow = matches!((current, delta), (Bson::Int32(_), Bson::Int32(_)));
            Ok(if narrow {
                i32::try_from(sum).map_or(Bson::Int64(sum), Bson::Int32)
            } else {
                Bson::Int64(sum)
            })
        }
        (Number::Float(x), Number::Float(y)) => Ok(Bson::Double(x + y)),
        (Number::Int(x), Number::Float(y)) | (Number::Float(y), Number::Int(x)) => {
            Ok(Bson::Double(x as f64 + y))
        }
    }
}

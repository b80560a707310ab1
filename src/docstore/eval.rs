use std::cmp::Ordering;

use bson::{Bson, Document};

use super::parse::{CmpOp, Predicate};

const MAX_PATH_DEPTH: usize = 32;

/// Dotted-path lookup through nested documents.
#[must_use]
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut cur = doc.get(parts.next()?);
    for (depth, part) in parts.enumerate() {
        if depth + 1 >= MAX_PATH_DEPTH {
            return None;
        }
        cur = match cur {
            Some(Bson::Document(d)) => d.get(part),
            _ => return None,
        };
    }
    cur
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(b: &Bson) -> Option<f64> {
    match b {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

fn is_nullish(v: Option<&Bson>) -> bool {
    matches!(v, None | Some(Bson::Null | Bson::Undefined))
}

#[allow(clippy::float_cmp)]
fn bson_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => match (a, b) {
            (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
                as_i64(a) == as_i64(b)
            }
            _ => x == y,
        },
        _ => a == b,
    }
}

const fn as_i64(b: &Bson) -> Option<i64> {
    match b {
        Bson::Int32(i) => Some(*i as i64),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

/// Same-kind comparison; `None` across kinds, which filters treat as no match.
fn compare_same_kind(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_i64(a), as_i64(b)) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.timestamp_millis().cmp(&y.timestamp_millis())),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        _ => None,
    }
}

fn equals(field: Option<&Bson>, value: &Bson) -> bool {
    if is_nullish(Some(value)) {
        return is_nullish(field);
    }
    field.is_some_and(|f| bson_equal(f, value))
}

/// Evaluates a predicate: equality with null matches missing fields, `$ne`/`$nin` match
/// missing fields, and range operators never match null or a value of another kind.
#[must_use]
pub fn eval_predicate(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::And(ps) => ps.iter().all(|p| eval_predicate(doc, p)),
        Predicate::Or(ps) => ps.iter().any(|p| eval_predicate(doc, p)),
        Predicate::Cmp { path, op, value } => {
            let field = get_path(doc, path);
            match op {
                CmpOp::Eq => equals(field, value),
                CmpOp::Ne => !equals(field, value),
                CmpOp::Gt | CmpOp::Gte | CmpOp::Lt | CmpOp::Lte => {
                    let Some(ord) = field.and_then(|f| compare_same_kind(f, value)) else { return false };
                    match op {
                        CmpOp::Gt => ord.is_gt(),
                        CmpOp::Gte => ord.is_ge(),
                        CmpOp::Lt => ord.is_lt(),
                        _ => ord.is_le(),
                    }
                }
            }
        }
        Predicate::In { path, values } => {
            let field = get_path(doc, path);
            values.iter().any(|v| equals(field, v))
        }
        Predicate::Nin { path, values } => {
            let field = get_path(doc, path);
            !values.iter().any(|v| equals(field, v))
        }
        Predicate::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Predicate::Regex { path, regex } => {
            matches!(get_path(doc, path), Some(Bson::String(s)) if regex.is_match(s))
        }
    }
}

const fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null | Bson::Undefined => 0,
        Bson::Boolean(_) => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 2,
        Bson::String(_) => 3,
        Bson::DateTime(_) => 4,
        Bson::ObjectId(_) => 5,
        Bson::Document(_) => 6,
        Bson::Array(_) => 7,
        _ => 8,
    }
}

/// Total order for sorting; a missing field sorts as null.
#[must_use]
pub fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let (a, b) = (a.unwrap_or(&Bson::Null), b.unwrap_or(&Bson::Null));
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| compare_same_kind(a, b).unwrap_or(Ordering::Equal))
}

/// Compares two documents by a sort document such as `{"age": 1, "name": -1}`.
#[must_use]
pub fn compare_docs(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, dir) in sort {
        let ord = compare_bson(get_path(a, field), get_path(b, field));
        if ord != Ordering::Equal {
            let descending = as_f64(dir).is_some_and(|d| d < 0.0);
            return if descending { ord.reverse() } else { ord };
        }
    }
    Ordering::Equal
}

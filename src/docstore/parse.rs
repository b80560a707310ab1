use bson::{Bson, Document, oid::ObjectId};
use regex::{Regex, RegexBuilder};

use crate::errors::{RepoError, Result};

/// Nesting cap for `$and`/`$or` trees.
pub(crate) const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Parsed form of an operator document.
#[derive(Debug, Clone)]
pub enum Predicate {
    True,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Cmp { path: String, op: CmpOp, value: Bson },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Exists { path: String, exists: bool },
    Regex { path: String, regex: Regex },
}

fn invalid(msg: impl std::fmt::Display) -> RepoError {
    RepoError::invalid(format!("Invalid filter document: {msg}"))
}

fn branches(op: &str, value: &Bson, depth: usize) -> Result<Vec<Predicate>> {
    let Bson::Array(items) = value else {
        return Err(invalid(format!("{op} expects an array")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => parse_at(d, depth + 1),
            _ => Err(invalid(format!("{op} expects an array of documents"))),
        })
        .collect()
}

fn is_operator_doc(d: &Document) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn field_predicates(path: &str, ops: &Document) -> Result<Vec<Predicate>> {
    let options = match ops.get("$options") {
        None => "",
        Some(Bson::String(s)) => s.as_str(),
        Some(_) => return Err(invalid("$options expects a string")),
    };
    let mut out = Vec::with_capacity(ops.len());
    for (op, value) in ops {
        let cmp = match op.as_str() {
            "$eq" => Some(CmpOp::Eq),
            "$ne" => Some(CmpOp::Ne),
            "$gt" => Some(CmpOp::Gt),
            "$gte" => Some(CmpOp::Gte),
            "$lt" => Some(CmpOp::Lt),
            "$lte" => Some(CmpOp::Lte),
            _ => None,
        };
        let path = path.to_string();
        if let Some(op) = cmp {
            out.push(Predicate::Cmp { path, op, value: value.clone() });
            continue;
        }
        out.push(match op.as_str() {
            "$in" | "$nin" => {
                let Bson::Array(values) = value else {
                    return Err(invalid(format!("{op} expects an array")));
                };
                if op == "$in" {
                    Predicate::In { path, values: values.clone() }
                } else {
                    Predicate::Nin { path, values: values.clone() }
                }
            }
            "$exists" => match value {
                Bson::Boolean(exists) => Predicate::Exists { path, exists: *exists },
                _ => return Err(invalid("$exists expects a boolean")),
            },
            "$regex" => {
                let Bson::String(pattern) = value else {
                    return Err(invalid("$regex expects a string"));
                };
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(options.contains('i'))
                    .build()
                    .map_err(invalid)?;
                Predicate::Regex { path, regex }
            }
            "$options" => continue,
            other => return Err(invalid(format!("unknown operator {other}"))),
        });
    }
    Ok(out)
}

fn parse_at(filter: &Document, depth: usize) -> Result<Predicate> {
    if depth > MAX_DEPTH {
        return Err(invalid("nested too deeply"));
    }
    let mut parts = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        match key.as_str() {
            "$and" => parts.push(Predicate::And(branches(key, value, depth)?)),
            "$or" => parts.push(Predicate::Or(branches(key, value, depth)?)),
            k if k.starts_with('$') => return Err(invalid(format!("unknown top-level operator {k}"))),
            path => match value {
                Bson::Document(ops) if is_operator_doc(ops) => parts.extend(field_predicates(path, ops)?),
                literal => parts.push(Predicate::Cmp { path: path.to_string(), op: CmpOp::Eq, value: literal.clone() }),
            },
        }
    }
    Ok(match parts.len() {
        0 => Predicate::True,
        1 => parts.remove(0),
        _ => Predicate::And(parts),
    })
}

/// Parses an operator document (`{"age": {"$gt": 18}, "$or": [...]}`) into a predicate.
///
/// # Errors
/// `InvalidArgument` for unknown operators or malformed arguments.
pub fn parse_filter(filter: &Document) -> Result<Predicate> {
    parse_at(filter, 0)
}

/// Converts JSON into bson. Integers become `Int64`; `{"$oid": "<hex>"}` becomes an
/// `ObjectId`.
#[must_use]
pub fn json_to_bson(value: serde_json::Value) -> Bson {
    use serde_json::Value as J;
    match value {
        J::Null => Bson::Null,
        J::Bool(b) => Bson::Boolean(b),
        J::Number(n) => n.as_i64().map_or_else(|| Bson::Double(n.as_f64().unwrap_or(f64::NAN)), Bson::Int64),
        J::String(s) => Bson::String(s),
        J::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        J::Object(map) => {
            if map.len() == 1
                && let Some(J::String(hex)) = map.get("$oid")
                && let Ok(oid) = ObjectId::parse_str(hex)
            {
                return Bson::ObjectId(oid);
            }
            let mut doc = Document::new();
            for (k, v) in map {
                doc.insert(k, json_to_bson(v));
            }
            Bson::Document(doc)
        }
    }
}

/// # Errors
/// `Json` for malformed text, `InvalidArgument` when the JSON is not an object or is not
/// a valid filter.
pub fn parse_filter_json(json: &str) -> Result<(Document, Predicate)> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let Bson::Document(doc) = json_to_bson(value) else {
        return Err(invalid("expected a JSON object"));
    };
    let predicate = parse_filter(&doc)?;
    Ok((doc, predicate))
}

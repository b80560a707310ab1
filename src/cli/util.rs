use serde_json::Value as Json;

use crate::errors::{RepoError, Result};
use crate::query::{Filter, FilterFactory, IntoOrder, Order};
use crate::types::{Attributes, Value};

fn build(field: &str, op: &str, arg: Json) -> Result<Filter> {
    let value = Value::from(arg);
    match op {
        "eq" => FilterFactory::eq(field, value),
        "ne" => FilterFactory::not_eq(field, value),
        "lt" => FilterFactory::lt(field, value),
        "lte" => FilterFactory::lte(field, value),
        "gt" => FilterFactory::gt(field, value),
        "gte" => FilterFactory::gte(field, value),
        "in" => FilterFactory::in_(field, value),
        "nin" => FilterFactory::not_in(field, value),
        "like" => FilterFactory::like(field, value),
        other => Err(RepoError::invalid(format!("Unknown filter operator: {other}"))),
    }
}

fn object_filters(map: serde_json::Map<String, Json>) -> Result<Vec<Filter>> {
    let mut filters = Vec::with_capacity(map.len());
    for (key, val) in map {
        match (key.as_str(), val) {
            ("or", Json::Array(branches)) => {
                let mut alternatives = Vec::with_capacity(branches.len());
                for branch in branches {
                    let Json::Object(inner) = branch else {
                        return Err(RepoError::invalid("Each or branch must be an object"));
                    };
                    let mut group = object_filters(inner)?;
                    alternatives.push(if group.len() == 1 {
                        group.remove(0)
                    } else {
                        FilterFactory::and(group)
                    });
                }
                filters.push(FilterFactory::or(alternatives));
            }
            (_, Json::Object(ops)) => {
                if ops.is_empty() {
                    return Err(RepoError::invalid(format!("No operator given for {key}")));
                }
                for (op, arg) in ops {
                    filters.push(build(&key, &op, arg)?);
                }
            }
            (_, scalar) => filters.push(FilterFactory::eq(&key, Value::from(scalar))?),
        }
    }
    Ok(filters)
}

/// Parses a filter object such as `{"age": {"gte": 18}, "name": "John"}`.
///
/// Scalars mean equality; objects hold one or more of `eq`, `ne`, `lt`, `lte`, `gt`,
/// `gte`, `in`, `nin`, `like`; an `or` key takes an array of such objects.
///
/// # Errors
/// Malformed JSON, a non-object top level, or any filter the factory rejects.
pub fn parse_filters(text: &str) -> Result<Vec<Filter>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Json>(text)? {
        Json::Object(map) => object_filters(map),
        other => Err(RepoError::invalid(format!("Filter must be a JSON object but you gave {other}"))),
    }
}

/// Parses `field` or `field:order`; the order defaults to ascending.
///
/// # Errors
/// An order other than `asc` or `desc`.
pub fn parse_sort(text: &str) -> Result<(String, Order)> {
    match text.split_once(':') {
        Some((field, order)) => Ok((field.to_string(), order.into_order()?)),
        None => Ok((text.to_string(), Order::Asc)),
    }
}

/// Parses a JSON array of attribute objects, or a single object.
///
/// # Errors
/// Malformed JSON or elements that are not objects.
pub fn parse_records(text: &str) -> Result<Vec<Attributes>> {
    let items = match serde_json::from_str::<Json>(text)? {
        Json::Array(items) => items,
        obj @ Json::Object(_) => vec![obj],
        other => return Err(RepoError::invalid(format!("Records must be JSON objects but you gave {other}"))),
    };
    items
        .into_iter()
        .map(|item| match item {
            Json::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
            other => Err(RepoError::invalid(format!("Records must be JSON objects but you gave {other}"))),
        })
        .collect()
}

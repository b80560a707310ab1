use std::cmp::Ordering;

use super::filter::{Filter, Membership};
use super::types::{Order, Sort};
use crate::types::{Attributes, Value, compare_values, sort_order, values_equal};

static NULL: Value = Value::Null;

fn field_value<'a>(record: &'a Attributes, field: &str) -> &'a Value {
    record.get(field).unwrap_or(&NULL)
}

fn compares(record: &Attributes, field: &str, bound: &Value, accept: fn(Ordering) -> bool) -> bool {
    compare_values(field_value(record, field), bound).is_some_and(accept)
}

/// In-process evaluation of one filter; a missing field reads as null.
#[must_use]
pub fn matches(filter: &Filter, record: &Attributes) -> bool {
    match filter {
        Filter::Eq { field, value } => {
            let f = field_value(record, field.as_str());
            if value.is_null() { f.is_null() } else { !f.is_null() && values_equal(f, value) }
        }
        Filter::Neq { field, value } => {
            let f = field_value(record, field.as_str());
            if value.is_null() { !f.is_null() } else { f.is_null() || !values_equal(f, value) }
        }
        Filter::Lt { field, value } => compares(record, field.as_str(), value.get(), Ordering::is_lt),
        Filter::Lte { field, value } => compares(record, field.as_str(), value.get(), Ordering::is_le),
        Filter::Gt { field, value } => compares(record, field.as_str(), value.get(), Ordering::is_gt),
        Filter::Gte { field, value } => compares(record, field.as_str(), value.get(), Ordering::is_ge),
        Filter::In { field, values } => Membership::of(values).contains(field_value(record, field.as_str())),
        Filter::NotIn { field, values } => !Membership::of(values).contains(field_value(record, field.as_str())),
        Filter::Like { field, pattern } => match field_value(record, field.as_str()) {
            Value::Text(s) => s.to_lowercase().contains(&pattern.to_lowercase()),
            _ => false,
        },
        Filter::And { filters } => filters.iter().all(|f| matches(f, record)),
        Filter::Or { filters } => filters.iter().any(|f| matches(f, record)),
    }
}

/// Every top-level filter holds.
#[must_use]
pub fn matches_all(filters: &[Filter], record: &Attributes) -> bool {
    filters.iter().all(|f| matches(f, record))
}

/// Multi-key comparison; later sorts only break ties of earlier ones.
#[must_use]
pub fn compare_records(a: &Attributes, b: &Attributes, sorts: &[Sort]) -> Ordering {
    for s in sorts {
        let ord = sort_order(field_value(a, s.field.as_str()), field_value(b, s.field.as_str()));
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

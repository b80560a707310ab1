//! Translation between the query model and bson operator documents.

use bson::{Bson, Document, doc, oid::ObjectId};
use chrono::{DateTime, Utc};

use crate::errors::{RepoError, Result};
use crate::query::{Filter, Membership, Order, Sort};
use crate::types::{Attributes, Value};

pub const ID_KEY: &str = "_id";

/// Bson for a model value. Integers are stored as `Int64`, timestamps as bson dates.
#[must_use]
pub fn value_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(i) => Bson::Int64(*i),
        Value::Float(f) => Bson::Double(*f),
        Value::Text(s) => Bson::String(s.clone()),
        Value::Timestamp(t) => Bson::DateTime(bson::DateTime::from_millis(t.timestamp_millis())),
        Value::List(items) => Bson::Array(items.iter().map(value_to_bson).collect()),
    }
}

/// Identity values: hex text becomes an `ObjectId`.
#[must_use]
pub fn id_to_bson(value: &Value) -> Bson {
    match value {
        Value::Text(s) => ObjectId::parse_str(s).map_or_else(|_| value_to_bson(value), Bson::ObjectId),
        other => value_to_bson(other),
    }
}

#[must_use]
pub fn bson_to_value(value: &Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Int(i64::from(*i)),
        Bson::Int64(i) => Value::Int(*i),
        Bson::Double(f) => Value::Float(*f),
        Bson::String(s) => Value::Text(s.clone()),
        Bson::DateTime(d) => DateTime::<Utc>::from_timestamp_millis(d.timestamp_millis()).map_or(Value::Null, Value::Timestamp),
        Bson::ObjectId(oid) => Value::Text(oid.to_hex()),
        Bson::Array(items) => Value::List(items.iter().map(bson_to_value).collect()),
        other => Value::Text(other.to_string()),
    }
}

fn operator_document(ops: impl IntoIterator<Item = (&'static str, Bson)>) -> Document {
    ops.into_iter().map(|(op, v)| (op.to_string(), v)).collect()
}

/// Field and value mapping for one model: the identity attribute lives in `_id`.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    pub primary_key: &'a str,
}

impl Translator<'_> {
    fn key<'k>(&self, field: &'k str) -> &'k str {
        if field == self.primary_key { ID_KEY } else { field }
    }

    fn bson(&self, field: &str, value: &Value) -> Bson {
        if field == self.primary_key { id_to_bson(value) } else { value_to_bson(value) }
    }

    fn list(&self, field: &str, values: &[Value]) -> Bson {
        let Membership { values, has_null } = Membership::of(values);
        let mut out: Vec<Bson> = values.iter().map(|v| self.bson(field, v)).collect();
        if has_null {
            out.push(Bson::Null);
        }
        Bson::Array(out)
    }

    /// Operator entries for one field filter, e.g. `[("$gt", 18)]`.
    fn operators(&self, filter: &Filter) -> Vec<(&'static str, Bson)> {
        let field = filter.field().map(|f| f.as_str()).unwrap_or_default();
        match filter {
            Filter::Eq { value, .. } => vec![("$eq", self.bson(field, value))],
            Filter::Neq { value, .. } => vec![("$ne", self.bson(field, value))],
            Filter::Lt { value, .. } => vec![("$lt", self.bson(field, value.get()))],
            Filter::Lte { value, .. } => vec![("$lte", self.bson(field, value.get()))],
            Filter::Gt { value, .. } => vec![("$gt", self.bson(field, value.get()))],
            Filter::Gte { value, .. } => vec![("$gte", self.bson(field, value.get()))],
            Filter::In { values, .. } => vec![("$in", self.list(field, values))],
            Filter::NotIn { values, .. } => vec![("$nin", self.list(field, values))],
            Filter::Like { pattern, .. } => {
                vec![("$regex", Bson::String(regex::escape(pattern))), ("$options", Bson::String("i".into()))]
            }
            Filter::And { .. } | Filter::Or { .. } => Vec::new(),
        }
    }

    fn composite(&self, filter: &Filter) -> Result<Document> {
        match filter {
            Filter::Or { filters } if filters.is_empty() => Ok(doc! { ID_KEY: { "$in": [] } }),
            Filter::And { filters } if filters.is_empty() => Ok(Document::new()),
            Filter::Or { filters } | Filter::And { filters } => {
                let key = if matches!(filter, Filter::Or { .. }) { "$or" } else { "$and" };
                let branches = filters
                    .iter()
                    .map(|f| self.filters_to_document(std::slice::from_ref(f)).map(Bson::Document))
                    .collect::<Result<Vec<_>>>()?;
                Ok(doc! { key: branches })
            }
            _ => self.filters_to_document(std::slice::from_ref(filter)),
        }
    }

    /// Translates an implicit conjunction of filters into one filter document.
    ///
    /// A field's lone equality collapses to `{field: value}`. An equality next to other
    /// operators on the same field becomes `$eq`; operators that repeat on one field are
    /// combined under `$and`.
    ///
    /// # Errors
    /// `UnsupportedFilterCombination` for more than one equality on the same field.
    pub fn filters_to_document(&self, filters: &[Filter]) -> Result<Document> {
        let mut fields: Vec<(&str, Vec<&Filter>)> = Vec::new();
        let mut extra: Vec<Document> = Vec::new();
        for filter in filters {
            let Some(field) = filter.field() else {
                let translated = self.composite(filter)?;
                if !translated.is_empty() {
                    extra.push(translated);
                }
                continue;
            };
            match fields.iter_mut().find(|(f, _)| *f == field.as_str()) {
                Some((_, group)) => group.push(filter),
                None => fields.push((field.as_str(), vec![filter])),
            }
        }

        let mut out = Document::new();
        for (field, group) in fields {
            let key = self.key(field);
            let equalities = group.iter().filter(|f| matches!(f, Filter::Eq { .. })).count();
            if equalities > 1 {
                return Err(RepoError::UnsupportedFilterCombination(format!(
                    "more than one equality filter on field {field}"
                )));
            }
            if let [Filter::Eq { value, .. }] = group.as_slice() {
                out.insert(key, self.bson(field, value));
                continue;
            }
            let per_filter: Vec<Vec<(&str, Bson)>> = group.iter().map(|f| self.operators(f)).collect();
            let mut seen: Vec<&str> = Vec::new();
            let repeated = per_filter.iter().flatten().any(|(op, _)| {
                let dup = seen.contains(op);
                seen.push(*op);
                dup
            });
            if repeated {
                for ops in per_filter {
                    extra.push(doc! { key: operator_document(ops) });
                }
            } else {
                out.insert(key, operator_document(per_filter.into_iter().flatten()));
            }
        }

        match extra.len() {
            0 => {}
            1 if extra[0].keys().all(|k| !out.contains_key(k)) => {
                for (k, v) in extra.remove(0) {
                    out.insert(k, v);
                }
            }
            _ => {
                out.insert("$and", extra.into_iter().map(Bson::Document).collect::<Vec<_>>());
            }
        }
        Ok(out)
    }

    #[must_use]
    pub fn sorts_to_document(&self, sorts: &[Sort]) -> Document {
        sorts
            .iter()
            .map(|s| {
                let dir = if s.order == Order::Asc { 1 } else { -1 };
                (self.key(s.field.as_str()).to_string(), Bson::Int32(dir))
            })
            .collect()
    }

    /// Model attributes from a stored document; only `fields` are kept.
    #[must_use]
    pub fn document_to_attributes(&self, doc: &Document, fields: &[&str]) -> Attributes {
        fields
            .iter()
            .map(|f| {
                let v = doc.get(self.key(f)).map_or(Value::Null, bson_to_value);
                ((*f).to_string(), v)
            })
            .collect()
    }

    /// Stored document for model attributes; the identity is left to the store.
    #[must_use]
    pub fn attributes_to_document(&self, attrs: &Attributes) -> Document {
        attrs
            .iter()
            .filter(|(k, _)| k.as_str() != self.primary_key)
            .map(|(k, v)| (k.clone(), value_to_bson(v)))
            .collect()
    }
}

use std::fmt;

use serde::Serialize;

use crate::errors::{RepoError, Result};
use crate::types::Value;

/// A validated field identifier: an ASCII letter or `_`, then letters, digits, `_` or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FieldName(String);

impl FieldName {
    /// # Errors
    /// `InvalidArgument` when `name` is not an identifier.
    pub fn parse(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(RepoError::invalid(format!(
                "Field name must be a non-empty identifier but you gave {name:?}"
            )))
        }
    }

    /// For names declared by a model, which are identifiers already.
    pub(crate) fn known(name: &str) -> Self {
        Self(name.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FieldName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    Like,
    And,
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Like => "like",
            Self::And => "and",
            Self::Or => "or",
        };
        f.write_str(s)
    }
}

/// A value that is known not to be null; ordering filters only carry these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NonNullValue(Value);

impl NonNullValue {
    #[must_use]
    pub fn new(value: Value) -> Option<Self> {
        (!value.is_null()).then_some(Self(value))
    }

    #[must_use]
    pub const fn get(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Value {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Anything a sort direction can be given as: an [`Order`] or the strings `"asc"`/`"desc"`.
pub trait IntoOrder {
    /// # Errors
    /// `InvalidArgument` for anything other than `asc` or `desc`.
    fn into_order(self) -> Result<Order>;
}

impl IntoOrder for Order {
    fn into_order(self) -> Result<Order> {
        Ok(self)
    }
}

impl IntoOrder for &str {
    fn into_order(self) -> Result<Order> {
        match self {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(RepoError::invalid(format!(
                "Sort order must be 'asc' or 'desc' but you gave {other:?}"
            ))),
        }
    }
}

impl IntoOrder for String {
    fn into_order(self) -> Result<Order> {
        self.as_str().into_order()
    }
}

impl IntoOrder for &String {
    fn into_order(self) -> Result<Order> {
        self.as_str().into_order()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub field: FieldName,
    pub order: Order,
}

impl Sort {
    #[must_use]
    pub const fn new(field: FieldName, order: Order) -> Self {
        Self { field, order }
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self { field: self.field.clone(), order: self.order.reverse() }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.order)
    }
}

/// Snapshot of a cursor handed to an executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    pub filters: Vec<super::Filter>,
    pub sorts: Vec<Sort>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    #[must_use]
    pub fn with_sorts(mut self, sorts: Vec<Sort>) -> Self {
        self.sorts = sorts;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same filters, no sorting or paging; what count and remove operate on.
    #[must_use]
    pub fn unpaged(&self) -> Self {
        Self { filters: self.filters.clone(), ..Self::default() }
    }
}

/// `created_at asc, <id> asc` when the model keeps a creation time, `<id> asc` otherwise.
#[must_use]
pub fn default_sorts(fields: &[&str], id_field: &str) -> Vec<Sort> {
    let mut sorts = Vec::with_capacity(2);
    if fields.contains(&crate::model::CREATED_AT) {
        sorts.push(Sort::new(FieldName::known(crate::model::CREATED_AT), Order::Asc));
    }
    sorts.push(Sort::new(FieldName::known(id_field), Order::Asc));
    sorts
}

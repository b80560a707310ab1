use serde::Serialize;

use super::types::{FieldName, NonNullValue, Operator};
use crate::types::{Value, values_equal};

/// One node of the predicate tree. Build these through [`super::FilterFactory`] or a cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    Eq { field: FieldName, value: Value },
    Neq { field: FieldName, value: Value },
    Lt { field: FieldName, value: NonNullValue },
    Lte { field: FieldName, value: NonNullValue },
    Gt { field: FieldName, value: NonNullValue },
    Gte { field: FieldName, value: NonNullValue },
    In { field: FieldName, values: Vec<Value> },
    NotIn { field: FieldName, values: Vec<Value> },
    /// Case-insensitive substring match; `pattern` is the raw fragment.
    Like { field: FieldName, pattern: String },
    And { filters: Vec<Filter> },
    Or { filters: Vec<Filter> },
}

impl Filter {
    /// Field the node constrains; `None` for composites.
    #[must_use]
    pub const fn field(&self) -> Option<&FieldName> {
        match self {
            Self::Eq { field, .. }
            | Self::Neq { field, .. }
            | Self::Lt { field, .. }
            | Self::Lte { field, .. }
            | Self::Gt { field, .. }
            | Self::Gte { field, .. }
            | Self::In { field, .. }
            | Self::NotIn { field, .. }
            | Self::Like { field, .. } => Some(field),
            Self::And { .. } | Self::Or { .. } => None,
        }
    }

    #[must_use]
    pub const fn operator(&self) -> Operator {
        match self {
            Self::Eq { .. } => Operator::Eq,
            Self::Neq { .. } => Operator::Neq,
            Self::Lt { .. } => Operator::Lt,
            Self::Lte { .. } => Operator::Lte,
            Self::Gt { .. } => Operator::Gt,
            Self::Gte { .. } => Operator::Gte,
            Self::In { .. } => Operator::In,
            Self::NotIn { .. } => Operator::NotIn,
            Self::Like { .. } => Operator::Like,
            Self::And { .. } => Operator::And,
            Self::Or { .. } => Operator::Or,
        }
    }

    /// Comparison operand of an ordering node.
    #[must_use]
    pub const fn bound(&self) -> Option<&Value> {
        match self {
            Self::Lt { value, .. } | Self::Lte { value, .. } | Self::Gt { value, .. } | Self::Gte { value, .. } => {
                Some(value.get())
            }
            _ => None,
        }
    }
}

/// Membership values split for null-aware translation: the distinct non-null values in
/// first-seen order, and whether null was among them.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub values: Vec<Value>,
    pub has_null: bool,
}

impl Membership {
    #[must_use]
    pub fn of(values: &[Value]) -> Self {
        let mut distinct: Vec<Value> = Vec::with_capacity(values.len());
        let mut has_null = false;
        for v in values {
            if v.is_null() {
                has_null = true;
            } else if !distinct.iter().any(|d| values_equal(d, v)) {
                distinct.push(v.clone());
            }
        }
        Self { values: distinct, has_null }
    }

    /// Whether a (possibly null) field value is a member.
    #[must_use]
    pub fn contains(&self, field: &Value) -> bool {
        if field.is_null() {
            self.has_null
        } else {
            self.values.iter().any(|v| values_equal(field, v))
        }
    }
}

use super::filter::Filter;
use super::types::{FieldName, NonNullValue};
use crate::errors::{RepoError, Result};
use crate::types::Value;

/// The one place malformed filter arguments are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterFactory;

fn scalar(value: Value) -> Result<Value> {
    if value.is_list() {
        return Err(RepoError::invalid(format!(
            "Filter value must be a scalar but you gave {}",
            value.inspect()
        )));
    }
    Ok(value)
}

fn bound(name: &str, value: Value) -> Result<NonNullValue> {
    NonNullValue::new(scalar(value)?)
        .ok_or_else(|| RepoError::invalid(format!("{name} filter value cannot be null")))
}

fn sequence(name: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(RepoError::invalid(format!(
            "{name} filter value must be a sequence but you gave {}",
            other.inspect()
        ))),
    }
}

impl FilterFactory {
    /// # Errors
    /// Invalid field name, or a list value.
    pub fn eq(field: &str, value: impl Into<Value>) -> Result<Filter> {
        Ok(Filter::Eq { field: FieldName::parse(field)?, value: scalar(value.into())? })
    }

    /// # Errors
    /// Invalid field name, or a list value.
    pub fn not_eq(field: &str, value: impl Into<Value>) -> Result<Filter> {
        Ok(Filter::Neq { field: FieldName::parse(field)?, value: scalar(value.into())? })
    }

    /// # Errors
    /// Invalid field name, or a null or list value.
    pub fn lt(field: &str, value: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        Ok(Filter::Lt { field, value: bound("Less than", value.into())? })
    }

    /// # Errors
    /// Invalid field name, or a null or list value.
    pub fn lte(field: &str, value: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        Ok(Filter::Lte { field, value: bound("Less than or equal to", value.into())? })
    }

    /// # Errors
    /// Invalid field name, or a null or list value.
    pub fn gt(field: &str, value: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        Ok(Filter::Gt { field, value: bound("Greater than", value.into())? })
    }

    /// # Errors
    /// Invalid field name, or a null or list value.
    pub fn gte(field: &str, value: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        Ok(Filter::Gte { field, value: bound("Greater than or equal to", value.into())? })
    }

    /// `values` must convert to a [`Value::List`]: a `Vec`, an array or a range.
    ///
    /// # Errors
    /// Invalid field name, or a value that is not a sequence.
    pub fn in_(field: &str, values: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        Ok(Filter::In { field, values: sequence("Inclusion", values.into())? })
    }

    /// # Errors
    /// Invalid field name, or a value that is not a sequence.
    pub fn not_in(field: &str, values: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        Ok(Filter::NotIn { field, values: sequence("Exclusion", values.into())? })
    }

    /// # Errors
    /// Invalid field name, or a fragment that is not text.
    pub fn like(field: &str, fragment: impl Into<Value>) -> Result<Filter> {
        let field = FieldName::parse(field)?;
        match fragment.into() {
            Value::Text(pattern) => Ok(Filter::Like { field, pattern }),
            other => Err(RepoError::invalid(format!(
                "Like filter value must be a string but you gave {}",
                other.inspect()
            ))),
        }
    }

    #[must_use]
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Filter {
        Filter::Or { filters: filters.into_iter().collect() }
    }

    #[must_use]
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Filter {
        Filter::And { filters: filters.into_iter().collect() }
    }
}

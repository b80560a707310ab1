use super::factory::FilterFactory;
use super::filter::Filter;
use super::types::{FieldName, IntoOrder, Query, Sort};
use crate::errors::{RepoError, Result};
use crate::types::Value;

/// The execution side of a cursor; one implementation per storage backend.
pub trait QueryExecutor {
    type Output;

    /// # Errors
    /// Backend failures.
    fn execute_find(&self, query: &Query) -> Result<Vec<Self::Output>>;

    /// Matching records, ignoring sorts and paging.
    ///
    /// # Errors
    /// Backend failures.
    fn execute_count(&self, query: &Query) -> Result<u64>;

    /// Deletes what `execute_find` would match, ignoring sorts and paging.
    ///
    /// # Errors
    /// Backend failures.
    fn execute_remove(&self, query: &Query) -> Result<()>;

    /// Ordering used by `first`/`last` when the caller gave none.
    fn default_sorts(&self) -> Vec<Sort>;
}

/// Accumulates filters, sorts and paging, then hands a [`Query`] to its executor.
///
/// Builder methods consume the cursor; terminals borrow it, so one cursor can be counted
/// and then fetched.
#[must_use]
pub struct Cursor<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    filters: Vec<Filter>,
    sorts: Vec<Sort>,
    limit: Option<u64>,
    offset: Option<u64>,
}

fn non_negative(name: &str, value: Value) -> Result<Option<u64>> {
    let parsed = match &value {
        Value::Null => return Ok(None),
        Value::Int(n) => u64::try_from(*n).ok(),
        Value::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| RepoError::invalid(format!("{name} must be an integer but you gave {}", value.inspect())))
}

impl<'a, E: QueryExecutor + ?Sized> Cursor<'a, E> {
    pub const fn new(executor: &'a E) -> Self {
        Self { executor, filters: Vec::new(), sorts: Vec::new(), limit: None, offset: None }
    }

    /// Adds an already built filter, typically from [`FilterFactory`].
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    fn push(self, filter: Result<Filter>) -> Result<Self> {
        Ok(self.filter(filter?))
    }

    /// # Errors
    /// See [`FilterFactory::eq`].
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::eq(field, value))
    }

    /// # Errors
    /// See [`FilterFactory::not_eq`].
    pub fn not_eq(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::not_eq(field, value))
    }

    /// # Errors
    /// See [`FilterFactory::lt`].
    pub fn lt(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::lt(field, value))
    }

    /// # Errors
    /// See [`FilterFactory::lte`].
    pub fn lte(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::lte(field, value))
    }

    /// # Errors
    /// See [`FilterFactory::gt`].
    pub fn gt(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::gt(field, value))
    }

    /// # Errors
    /// See [`FilterFactory::gte`].
    pub fn gte(self, field: &str, value: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::gte(field, value))
    }

    /// # Errors
    /// See [`FilterFactory::in_`].
    pub fn in_(self, field: &str, values: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::in_(field, values))
    }

    /// # Errors
    /// See [`FilterFactory::not_in`].
    pub fn not_in(self, field: &str, values: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::not_in(field, values))
    }

    /// # Errors
    /// See [`FilterFactory::like`].
    pub fn like(self, field: &str, fragment: impl Into<Value>) -> Result<Self> {
        self.push(FilterFactory::like(field, fragment))
    }

    pub fn or(self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filter(FilterFactory::or(filters))
    }

    /// The first sort is the primary key; later ones break ties in call order.
    ///
    /// # Errors
    /// Invalid field name or an order other than `asc`/`desc`.
    pub fn sort(mut self, field: &str, order: impl IntoOrder) -> Result<Self> {
        let field = FieldName::parse(field)?;
        self.sorts.push(Sort::new(field, order.into_order()?));
        Ok(self)
    }

    /// Null keeps the previous limit.
    ///
    /// # Errors
    /// Anything but a non-negative integer or a string of digits.
    pub fn limit(mut self, limit: impl Into<Value>) -> Result<Self> {
        if let Some(n) = non_negative("Limit", limit.into())? {
            self.limit = Some(n);
        }
        Ok(self)
    }

    /// Null keeps the previous offset.
    ///
    /// # Errors
    /// Anything but a non-negative integer or a string of digits.
    pub fn offset(mut self, offset: impl Into<Value>) -> Result<Self> {
        if let Some(n) = non_negative("Offset", offset.into())? {
            self.offset = Some(n);
        }
        Ok(self)
    }

    /// Snapshot of the accumulated state.
    #[must_use]
    pub fn query(&self) -> Query {
        Query {
            filters: self.filters.clone(),
            sorts: self.sorts.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }

    /// # Errors
    /// Backend failures.
    pub fn all(&self) -> Result<Vec<E::Output>> {
        self.executor.execute_find(&self.query())
    }

    /// # Errors
    /// Backend failures.
    pub fn count(&self) -> Result<u64> {
        self.executor.execute_count(&self.query().unpaged())
    }

    /// Deletes every record `all` would match regardless of sorts and paging.
    ///
    /// # Errors
    /// Backend failures.
    pub fn remove(&self) -> Result<()> {
        self.executor.execute_remove(&self.query().unpaged())
    }

    fn effective_sorts(&self) -> Vec<Sort> {
        if self.sorts.is_empty() { self.executor.default_sorts() } else { self.sorts.clone() }
    }

    /// # Errors
    /// Backend failures.
    pub fn first(&self) -> Result<Option<E::Output>> {
        let query = self.query().with_sorts(self.effective_sorts()).with_limit(1);
        Ok(self.executor.execute_find(&query)?.into_iter().next())
    }

    /// `first` with every sort direction inverted.
    ///
    /// # Errors
    /// Backend failures.
    pub fn last(&self) -> Result<Option<E::Output>> {
        let sorts = self.effective_sorts().iter().map(Sort::reversed).collect();
        let query = self.query().with_sorts(sorts).with_limit(1);
        Ok(self.executor.execute_find(&query)?.into_iter().next())
    }
}

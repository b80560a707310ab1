//! Create/update/remove surface shared by every backend, built on top of the cursor.

use std::sync::Arc;

use crate::errors::{RepoError, Result};
use crate::model::{Clock, Model, SystemClock, CREATED_AT, UPDATED_AT};
use crate::query::{Cursor, IntoOrder, QueryExecutor};
use crate::types::{Attributes, Value};

/// Storage operations a backend provides beyond query execution.
///
/// `Record` is the storage-shaped model; results come back as `Self::Output`, which is
/// either the same type or a separate domain model projected from it.
pub trait Adapter: QueryExecutor<Output: Model> {
    type Record: Model;

    /// Identity attribute, `Record::ID_FIELD` unless configured otherwise.
    fn primary_key(&self) -> &str;

    /// `Ok(None)` for identities that do not resolve, including ones that cannot be parsed.
    ///
    /// # Errors
    /// Backend failures.
    fn find_by_id(&self, id: &Value) -> Result<Option<Self::Output>>;

    /// Persists a new record and returns its identity. `attrs` never holds the identity.
    ///
    /// # Errors
    /// Backend failures.
    fn insert(&self, attrs: Attributes) -> Result<Value>;

    /// Overwrites the given attributes of an existing record; `false` when it is gone.
    ///
    /// # Errors
    /// Backend failures.
    fn patch(&self, id: &Value, attrs: Attributes) -> Result<bool>;

    /// # Errors
    /// Backend failures.
    fn delete(&self, id: &Value) -> Result<bool>;
}

/// Repository over one adapter. Timestamps come from the injected [`Clock`].
pub struct Repository<A: Adapter> {
    adapter: A,
    clock: Arc<dyn Clock>,
}

impl<A: Adapter> Repository<A> {
    #[must_use]
    pub fn new(adapter: A) -> Self {
        Self::with_clock(adapter, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(adapter: A, clock: Arc<dyn Clock>) -> Self {
        Self { adapter, clock }
    }

    #[must_use]
    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    /// A fresh cursor over this repository's records.
    pub const fn find(&self) -> Cursor<'_, A> {
        Cursor::new(&self.adapter)
    }

    /// # Errors
    /// Backend failures; an unknown id is `Ok(None)`.
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<A::Output>> {
        self.adapter.find_by_id(&id.into())
    }

    fn id_of(&self, model: &A::Output) -> Value {
        model.get(self.adapter.primary_key()).unwrap_or(Value::Null)
    }

    fn without_identity(&self, mut attrs: Attributes) -> Attributes {
        attrs.remove(self.adapter.primary_key());
        attrs
    }

    fn stamp(&self, attrs: &mut Attributes, fields: &[&str]) {
        let now = Value::Timestamp(self.clock.now());
        for field in fields {
            if A::Record::has_field(field) {
                attrs.insert((*field).to_string(), now.clone());
            }
        }
    }

    fn read_back(&self, id: Value) -> Result<A::Output> {
        match self.adapter.find_by_id(&id)? {
            Some(model) => Ok(model),
            None => Err(RepoError::not_found("read back", id)),
        }
    }

    /// Stores a new record. Any identity in `attrs` is ignored; `created_at` and
    /// `updated_at` are stamped when the model has them.
    ///
    /// # Errors
    /// `InvalidArgument` for attributes the model does not declare, or backend failures.
    pub fn create(&self, attrs: Attributes) -> Result<A::Output> {
        let mut attrs = self.without_identity(attrs);
        crate::model::verify_attributes::<A::Record>(&attrs)?;
        self.stamp(&mut attrs, &[CREATED_AT, UPDATED_AT]);
        let id = self.adapter.insert(attrs)?;
        log::debug!(target: "repokit::repository", "created record {id}");
        self.read_back(id)
    }

    /// # Errors
    /// See [`Repository::create`].
    pub fn create_model(&self, model: &A::Output) -> Result<A::Output> {
        self.create(model.to_attributes())
    }

    /// Merges the stored record, `model`, then `attrs`; identity changes are dropped and
    /// `updated_at` is restamped.
    ///
    /// # Errors
    /// `NotFound` when the model's identity does not resolve.
    pub fn update(&self, model: &A::Output, attrs: Attributes) -> Result<A::Output> {
        let id = self.id_of(model);
        let Some(stored) = self.adapter.find_by_id(&id)? else {
            return Err(RepoError::not_found("update", id));
        };
        let mut merged = stored.to_attributes();
        merged.extend(model.to_attributes());
        merged.extend(attrs);
        let mut merged = self.without_identity(merged);
        crate::model::verify_attributes::<A::Record>(&merged)?;
        self.stamp(&mut merged, &[UPDATED_AT]);
        if !self.adapter.patch(&id, merged)? {
            return Err(RepoError::not_found("update", id));
        }
        log::debug!(target: "repokit::repository", "updated record {id}");
        self.read_back(id)
    }

    /// # Errors
    /// `NotFound` when `id` does not resolve.
    pub fn update_by_id(&self, id: impl Into<Value>, attrs: Attributes) -> Result<A::Output> {
        let id = id.into();
        match self.adapter.find_by_id(&id)? {
            Some(stored) => self.update(&stored, attrs),
            None => Err(RepoError::not_found("update", id)),
        }
    }

    /// # Errors
    /// `NotFound` when `id` does not resolve.
    pub fn remove_by_id(&self, id: impl Into<Value>) -> Result<()> {
        let id = id.into();
        let found = self.adapter.find_by_id(&id)?.is_some();
        if found && self.adapter.delete(&id)? {
            log::debug!(target: "repokit::repository", "removed record {id}");
            return Ok(());
        }
        Err(RepoError::not_found("remove", id))
    }

    /// # Errors
    /// `NotFound` when the model's identity does not resolve.
    pub fn remove(&self, model: &A::Output) -> Result<()> {
        self.remove_by_id(self.id_of(model))
    }

    /// # Errors
    /// Backend failures.
    pub fn remove_all(&self) -> Result<()> {
        self.find().remove()
    }

    /// # Errors
    /// Backend failures.
    pub fn all(&self) -> Result<Vec<A::Output>> {
        self.find().all()
    }

    /// # Errors
    /// Backend failures.
    pub fn first(&self) -> Result<Option<A::Output>> {
        self.find().first()
    }

    /// # Errors
    /// Backend failures.
    pub fn last(&self) -> Result<Option<A::Output>> {
        self.find().last()
    }

    /// # Errors
    /// Backend failures.
    pub fn count(&self) -> Result<u64> {
        self.find().count()
    }

    /// # Errors
    /// See [`Cursor::eq`].
    pub fn eq(&self, field: &str, value: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().eq(field, value)
    }

    /// # Errors
    /// See [`Cursor::not_eq`].
    pub fn not_eq(&self, field: &str, value: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().not_eq(field, value)
    }

    /// # Errors
    /// See [`Cursor::lt`].
    pub fn lt(&self, field: &str, value: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().lt(field, value)
    }

    /// # Errors
    /// See [`Cursor::lte`].
    pub fn lte(&self, field: &str, value: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().lte(field, value)
    }

    /// # Errors
    /// See [`Cursor::gt`].
    pub fn gt(&self, field: &str, value: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().gt(field, value)
    }

    /// # Errors
    /// See [`Cursor::gte`].
    pub fn gte(&self, field: &str, value: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().gte(field, value)
    }

    /// # Errors
    /// See [`Cursor::in_`].
    pub fn in_(&self, field: &str, values: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().in_(field, values)
    }

    /// # Errors
    /// See [`Cursor::not_in`].
    pub fn not_in(&self, field: &str, values: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().not_in(field, values)
    }

    /// # Errors
    /// See [`Cursor::like`].
    pub fn like(&self, field: &str, fragment: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().like(field, fragment)
    }

    /// # Errors
    /// See [`Cursor::sort`].
    pub fn sort(&self, field: &str, order: impl IntoOrder) -> Result<Cursor<'_, A>> {
        self.find().sort(field, order)
    }

    /// # Errors
    /// See [`Cursor::limit`].
    pub fn limit(&self, limit: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().limit(limit)
    }

    /// # Errors
    /// See [`Cursor::offset`].
    pub fn offset(&self, offset: impl Into<Value>) -> Result<Cursor<'_, A>> {
        self.find().offset(offset)
    }
}

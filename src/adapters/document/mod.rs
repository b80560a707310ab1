//! Document-store backend: queries become bson operator documents executed by a
//! [`DocumentCollection`].

mod translate;

use std::marker::PhantomData;
use std::sync::Arc;

use bson::{Bson, Document, doc};

pub use translate::{ID_KEY, Translator, bson_to_value, id_to_bson, value_to_bson};

use crate::docstore::{Collection, FindOptions};
use crate::errors::Result;
use crate::model::{Model, coerce, normalize, project};
use crate::query::{Query, QueryExecutor, Sort, default_sorts};
use crate::query_trace;
use crate::repository::Adapter;
use crate::types::{Attributes, Value};

/// The operations the adapter needs from a document store.
pub trait DocumentCollection {
    /// # Errors
    /// Store failures.
    fn insert_one(&self, doc: Document) -> Result<Bson>;

    /// # Errors
    /// Store failures or a malformed filter.
    fn replace_one(&self, filter: &Document, replacement: Document) -> Result<u64>;

    /// # Errors
    /// Store failures or a malformed filter.
    fn find(&self, filter: &Document, opts: &FindOptions) -> Result<Vec<Document>>;

    /// # Errors
    /// Store failures or a malformed filter.
    fn count_documents(&self, filter: &Document) -> Result<u64>;

    /// # Errors
    /// Store failures or a malformed filter.
    fn delete_many(&self, filter: &Document) -> Result<u64>;
}

impl DocumentCollection for Collection {
    fn insert_one(&self, doc: Document) -> Result<Bson> {
        Self::insert_one(self, doc)
    }

    fn replace_one(&self, filter: &Document, replacement: Document) -> Result<u64> {
        Self::replace_one(self, filter, replacement)
    }

    fn find(&self, filter: &Document, opts: &FindOptions) -> Result<Vec<Document>> {
        Self::find(self, filter, opts)
    }

    fn count_documents(&self, filter: &Document) -> Result<u64> {
        Self::count_documents(self, filter)
    }

    fn delete_many(&self, filter: &Document) -> Result<u64> {
        Self::delete_many(self, filter)
    }
}

impl<C: DocumentCollection + ?Sized> DocumentCollection for Arc<C> {
    fn insert_one(&self, doc: Document) -> Result<Bson> {
        (**self).insert_one(doc)
    }

    fn replace_one(&self, filter: &Document, replacement: Document) -> Result<u64> {
        (**self).replace_one(filter, replacement)
    }

    fn find(&self, filter: &Document, opts: &FindOptions) -> Result<Vec<Document>> {
        (**self).find(filter, opts)
    }

    fn count_documents(&self, filter: &Document) -> Result<u64> {
        (**self).count_documents(filter)
    }

    fn delete_many(&self, filter: &Document) -> Result<u64> {
        (**self).delete_many(filter)
    }
}

/// Adapter over a document collection. The model's identity is stored as `_id`.
pub struct DocumentAdapter<C, M, D = M> {
    collection: C,
    primary_key: String,
    _models: PhantomData<fn() -> (M, D)>,
}

impl<C: DocumentCollection, M: Model, D: Model> DocumentAdapter<C, M, D> {
    #[must_use]
    pub fn new(collection: C) -> Self {
        Self { collection, primary_key: M::ID_FIELD.to_string(), _models: PhantomData }
    }

    #[must_use]
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        primary_key.clone_into(&mut self.primary_key);
        self
    }

    #[must_use]
    pub const fn collection(&self) -> &C {
        &self.collection
    }

    #[must_use]
    pub fn translator(&self) -> Translator<'_> {
        Translator { primary_key: &self.primary_key }
    }

    /// `None` when `id` is not an `ObjectId` in hex.
    fn id_filter(id: &Value) -> Option<Document> {
        match id_to_bson(id) {
            oid @ Bson::ObjectId(_) => Some(doc! { ID_KEY: oid }),
            _ => None,
        }
    }

    fn load(&self, filter: &Document, opts: &FindOptions) -> Result<Vec<D>> {
        let docs = self.collection.find(filter, opts)?;
        let tr = self.translator();
        docs.iter()
            .map(|d| project::<D>(normalize::<M>(tr.document_to_attributes(d, M::FIELDS))?))
            .collect()
    }
}

impl<C: DocumentCollection, M: Model, D: Model> QueryExecutor for DocumentAdapter<C, M, D> {
    type Output = D;

    fn execute_find(&self, query: &Query) -> Result<Vec<D>> {
        let tr = self.translator();
        let filter = tr.filters_to_document(&query.filters)?;
        let opts = FindOptions {
            sort: (!query.sorts.is_empty()).then(|| tr.sorts_to_document(&query.sorts)),
            skip: query.offset,
            limit: query.limit,
        };
        query_trace!("find {filter} sort={:?} skip={:?} limit={:?}", opts.sort, opts.skip, opts.limit);
        self.load(&filter, &opts)
    }

    fn execute_count(&self, query: &Query) -> Result<u64> {
        let filter = self.translator().filters_to_document(&query.filters)?;
        query_trace!("count {filter}");
        self.collection.count_documents(&filter)
    }

    fn execute_remove(&self, query: &Query) -> Result<()> {
        let filter = self.translator().filters_to_document(&query.filters)?;
        query_trace!("delete {filter}");
        let removed = self.collection.delete_many(&filter)?;
        log::debug!(target: "repokit::document", "removed {removed} documents");
        Ok(())
    }

    fn default_sorts(&self) -> Vec<Sort> {
        default_sorts(M::FIELDS, &self.primary_key)
    }
}

impl<C: DocumentCollection, M: Model, D: Model> Adapter for DocumentAdapter<C, M, D> {
    type Record = M;

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn find_by_id(&self, id: &Value) -> Result<Option<D>> {
        let Some(filter) = Self::id_filter(id) else { return Ok(None) };
        let opts = FindOptions { limit: Some(1), ..FindOptions::default() };
        Ok(self.load(&filter, &opts)?.into_iter().next())
    }

    fn insert(&self, attrs: Attributes) -> Result<Value> {
        let attrs = normalize::<M>(attrs)?;
        let id = self.collection.insert_one(self.translator().attributes_to_document(&attrs))?;
        Ok(bson_to_value(&id))
    }

    fn patch(&self, id: &Value, attrs: Attributes) -> Result<bool> {
        let Some(filter) = Self::id_filter(id) else { return Ok(false) };
        let opts = FindOptions { limit: Some(1), ..FindOptions::default() };
        let Some(mut current) = self.collection.find(&filter, &opts)?.into_iter().next() else {
            return Ok(false);
        };
        let changes = self.translator().attributes_to_document(&coerce::<M>(attrs)?);
        for (k, v) in changes {
            current.insert(k, v);
        }
        Ok(self.collection.replace_one(&filter, current)? > 0)
    }

    fn delete(&self, id: &Value) -> Result<bool> {
        let Some(filter) = Self::id_filter(id) else { return Ok(false) };
        Ok(self.collection.delete_many(&filter)? > 0)
    }
}

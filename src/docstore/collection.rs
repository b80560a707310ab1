use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bson::{Bson, Document, oid::ObjectId};
use parking_lot::RwLock;

use super::eval::{compare_docs, eval_predicate};
use super::parse::{Predicate, parse_filter};
use crate::errors::Result;

/// Options for [`Collection::find`]: a sort document, then skip, then limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// An in-process collection of bson documents keyed by `_id`, iterated in insertion order.
pub struct Collection {
    name: String,
    docs: RwLock<BTreeMap<u64, Document>>,
    seq: AtomicU64,
}

impl Collection {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), docs: RwLock::new(BTreeMap::new()), seq: AtomicU64::new(0) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching_keys(&self, predicate: &Predicate) -> Vec<u64> {
        self.docs.read().iter().filter(|(_, d)| eval_predicate(d, predicate)).map(|(k, _)| *k).collect()
    }

    /// Stores `doc`, assigning a fresh `ObjectId` when it has no `_id`. Returns the `_id`.
    ///
    /// # Errors
    /// Currently infallible; kept fallible to match the other write operations.
    pub fn insert_one(&self, mut doc: Document) -> Result<Bson> {
        let id = match doc.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                doc.insert("_id", id.clone());
                id
            }
        };
        let key = self.seq.fetch_add(1, Ordering::SeqCst);
        self.docs.write().insert(key, doc);
        log::trace!(target: "repokit::docstore", "{}: inserted {id}", self.name);
        Ok(id)
    }

    /// Replaces the first match, keeping its `_id`. Returns the number replaced.
    ///
    /// # Errors
    /// `InvalidArgument` for a malformed filter.
    pub fn replace_one(&self, filter: &Document, mut replacement: Document) -> Result<u64> {
        let predicate = parse_filter(filter)?;
        let mut docs = self.docs.write();
        let Some(current) = docs.values_mut().find(|d| eval_predicate(d, &predicate)) else {
            return Ok(0);
        };
        if let Some(id) = current.get("_id") {
            replacement.insert("_id", id.clone());
        }
        *current = replacement;
        Ok(1)
    }

    /// # Errors
    /// `InvalidArgument` for a malformed filter.
    pub fn find(&self, filter: &Document, opts: &FindOptions) -> Result<Vec<Document>> {
        let predicate = parse_filter(filter)?;
        let mut found: Vec<Document> =
            self.docs.read().values().filter(|d| eval_predicate(d, &predicate)).cloned().collect();
        if let Some(sort) = &opts.sort {
            found.sort_by(|a, b| compare_docs(a, b, sort));
        }
        let skip = opts.skip.map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let limit = opts.limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    /// # Errors
    /// `InvalidArgument` for a malformed filter.
    pub fn count_documents(&self, filter: &Document) -> Result<u64> {
        let predicate = parse_filter(filter)?;
        Ok(self.docs.read().values().filter(|d| eval_predicate(d, &predicate)).count() as u64)
    }

    /// Returns the number of documents removed.
    ///
    /// # Errors
    /// `InvalidArgument` for a malformed filter.
    pub fn delete_many(&self, filter: &Document) -> Result<u64> {
        let predicate = parse_filter(filter)?;
        let keys = self.matching_keys(&predicate);
        let mut docs = self.docs.write();
        Ok(keys.iter().filter(|k| docs.remove(*k).is_some()).count() as u64)
    }

    /// # Errors
    /// `InvalidArgument` for a malformed filter.
    pub fn delete_one(&self, filter: &Document) -> Result<u64> {
        let predicate = parse_filter(filter)?;
        let mut docs = self.docs.write();
        let key = docs.iter().find(|(_, d)| eval_predicate(d, &predicate)).map(|(k, _)| *k);
        Ok(u64::from(key.is_some_and(|k| docs.remove(&k).is_some())))
    }
}

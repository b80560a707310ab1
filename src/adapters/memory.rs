use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::errors::Result;
use crate::model::{Model, normalize, project};
use crate::query::{Query, QueryExecutor, Sort, compare_records, default_sorts, matches_all};
use crate::repository::Adapter;
use crate::types::{Attributes, Value};

/// Records kept in process, for tests and small datasets. Every query is a scan.
///
/// `M` is the stored model; results are projected into `D`.
pub struct MemoryAdapter<M, D = M> {
    records: RwLock<BTreeMap<u64, Attributes>>,
    next_id: AtomicU64,
    primary_key: String,
    _models: PhantomData<fn() -> (M, D)>,
}

impl<M: Model, D: Model> Default for MemoryAdapter<M, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model, D: Model> MemoryAdapter<M, D> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            primary_key: M::ID_FIELD.to_string(),
            _models: PhantomData,
        }
    }

    #[must_use]
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        primary_key.clone_into(&mut self.primary_key);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integers or digit strings; anything else names no record.
    fn key(id: &Value) -> Option<u64> {
        match id {
            Value::Int(n) => u64::try_from(*n).ok(),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn matching(&self, query: &Query) -> Vec<(u64, Attributes)> {
        self.records
            .read()
            .iter()
            .filter(|(_, rec)| matches_all(&query.filters, rec))
            .map(|(k, rec)| (*k, rec.clone()))
            .collect()
    }
}

fn page<T>(items: Vec<T>, query: &Query) -> Vec<T> {
    let skip = query.offset.map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
    let take = query.limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
    items.into_iter().skip(skip).take(take).collect()
}

impl<M: Model, D: Model> QueryExecutor for MemoryAdapter<M, D> {
    type Output = D;

    fn execute_find(&self, query: &Query) -> Result<Vec<D>> {
        let mut found = self.matching(query);
        found.sort_by(|(_, a), (_, b)| compare_records(a, b, &query.sorts));
        log::trace!(target: "repokit::memory", "{} records matched {} filters", found.len(), query.filters.len());
        page(found, query).into_iter().map(|(_, rec)| project::<D>(rec)).collect()
    }

    fn execute_count(&self, query: &Query) -> Result<u64> {
        let records = self.records.read();
        let n = records.values().filter(|rec| matches_all(&query.filters, rec)).count();
        Ok(n as u64)
    }

    fn execute_remove(&self, query: &Query) -> Result<()> {
        let keys: Vec<u64> = self.matching(query).into_iter().map(|(k, _)| k).collect();
        let mut records = self.records.write();
        for k in keys {
            records.remove(&k);
        }
        Ok(())
    }

    fn default_sorts(&self) -> Vec<Sort> {
        default_sorts(M::FIELDS, &self.primary_key)
    }
}

impl<M: Model, D: Model> Adapter for MemoryAdapter<M, D> {
    type Record = M;

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn find_by_id(&self, id: &Value) -> Result<Option<D>> {
        let Some(key) = Self::key(id) else { return Ok(None) };
        let record = self.records.read().get(&key).cloned();
        record.map(project::<D>).transpose()
    }

    fn insert(&self, mut attrs: Attributes) -> Result<Value> {
        let key = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = Value::try_from(key)?;
        attrs.insert(self.primary_key.clone(), id.clone());
        let record = normalize::<M>(attrs)?;
        self.records.write().insert(key, record);
        Ok(id)
    }

    fn patch(&self, id: &Value, attrs: Attributes) -> Result<bool> {
        let Some(key) = Self::key(id) else { return Ok(false) };
        let mut records = self.records.write();
        let Some(record) = records.get_mut(&key) else { return Ok(false) };
        let mut merged = record.clone();
        merged.extend(attrs);
        *record = normalize::<M>(merged)?;
        Ok(true)
    }

    fn delete(&self, id: &Value) -> Result<bool> {
        Ok(Self::key(id).is_some_and(|key| self.records.write().remove(&key).is_some()))
    }
}

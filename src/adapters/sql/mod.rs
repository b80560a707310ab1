//! SQLite backend. The table must already exist; identity is its integer primary key.

mod predicate;

use std::marker::PhantomData;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::config::DbConfig;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};

pub use predicate::{
    ColumnKind, Columns, Fragment, ICONTAINS, quote_ident, render_count, render_delete, render_filter,
    render_order, render_select, render_where,
};

use crate::errors::Result;
use crate::model::{Model, coerce, normalize, project};
use crate::query::{FilterFactory, Query, QueryExecutor, Sort, default_sorts};
use crate::query_trace;
use crate::repository::Adapter;
use crate::types::{Attributes, Value, timestamp_text};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Self::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Timestamp(t) => ToSqlOutput::Owned(SqlValue::Text(timestamp_text(t))),
            Self::List(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure("list values cannot be bound".into()));
            }
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn icontains(ctx: &Context<'_>) -> rusqlite::Result<bool> {
    let ValueRef::Text(haystack) = ctx.get_raw(0) else { return Ok(false) };
    let needle: String = ctx.get(1)?;
    Ok(String::from_utf8_lossy(haystack).to_lowercase().contains(&needle.to_lowercase()))
}

/// Kind of value `M` keeps in `field`: the one sample kind the model stores unchanged, or
/// [`ColumnKind::Any`] when it takes several or none.
fn column_kind<M: Model>(field: &str) -> ColumnKind {
    let samples = [
        Value::Bool(true),
        Value::Int(1),
        Value::Text(String::new()),
        Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH),
    ];
    let kept: Vec<ColumnKind> = samples
        .into_iter()
        .filter_map(|sample| {
            let kind = ColumnKind::of(&sample)?;
            let mut model = M::default();
            model.set(field, sample).ok()?;
            let stored = model.get(field)?;
            (ColumnKind::of(&stored) == Some(kind)).then_some(kind)
        })
        .collect();
    match kept.as_slice() {
        [only] => *only,
        _ => ColumnKind::Any,
    }
}

/// `M`'s fields as table columns; the primary key is the integer row key.
fn model_columns<M: Model>(primary_key: &str) -> Columns {
    Columns::new(M::FIELDS.iter().map(|field| {
        let kind = if *field == primary_key { ColumnKind::Number } else { column_kind::<M>(field) };
        (*field, kind)
    }))
}

/// Relational adapter over one table of a SQLite database.
pub struct SqlAdapter<M, D = M> {
    conn: Mutex<Connection>,
    table: String,
    primary_key: String,
    columns: Columns,
    _models: PhantomData<fn() -> (M, D)>,
}

impl<M: Model, D: Model> SqlAdapter<M, D> {
    /// Takes over `conn`: double-quoted string literals are switched off so an identifier
    /// can never turn into text, and the [`ICONTAINS`] function is registered.
    ///
    /// # Errors
    /// SQLite refuses the configuration or the function.
    pub fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false)?;
        conn.create_scalar_function(
            ICONTAINS,
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            icontains,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            primary_key: M::ID_FIELD.to_string(),
            columns: model_columns::<M>(M::ID_FIELD),
            _models: PhantomData,
        })
    }

    /// # Errors
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        Self::with_connection(Connection::open(path)?, table)
    }

    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    #[must_use]
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        primary_key.clone_into(&mut self.primary_key);
        self.columns = model_columns::<M>(primary_key);
        self
    }

    #[must_use]
    pub const fn columns(&self) -> &Columns {
        &self.columns
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Runs statements outside the query model, e.g. the host's schema setup.
    ///
    /// # Errors
    /// SQLite failures.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    fn key(id: &Value) -> Option<i64> {
        match id {
            Value::Int(n) => Some(*n),
            Value::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
            _ => None,
        }
    }

    fn select(&self, frag: &Fragment) -> Result<Vec<D>> {
        query_trace!("{}", frag.sql);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&frag.sql)?;
        let rows = stmt.query_map(params_from_iter(frag.params.iter()), |row| {
            let mut attrs = Attributes::new();
            for (i, field) in M::FIELDS.iter().enumerate() {
                attrs.insert((*field).to_string(), from_sql(row.get_ref(i)?));
            }
            Ok(attrs)
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        log::trace!(target: "repokit::sql", "{} rows from {}", records.len(), self.table);
        records.into_iter().map(|rec| project::<D>(normalize::<M>(rec)?)).collect()
    }

    fn execute(&self, frag: &Fragment) -> Result<usize> {
        query_trace!("{}", frag.sql);
        Ok(self.conn.lock().execute(&frag.sql, params_from_iter(frag.params.iter()))?)
    }

    fn by_id(&self, key: i64) -> Result<Query> {
        let filter = FilterFactory::eq(&self.primary_key, key)?;
        Ok(Query { filters: vec![filter], ..Query::default() })
    }
}

impl<M: Model, D: Model> QueryExecutor for SqlAdapter<M, D> {
    type Output = D;

    fn execute_find(&self, query: &Query) -> Result<Vec<D>> {
        self.select(&render_select(&self.table, &self.columns, query))
    }

    fn execute_count(&self, query: &Query) -> Result<u64> {
        let frag = render_count(&self.table, &self.columns, query);
        query_trace!("{}", frag.sql);
        let n: i64 = self.conn.lock().query_row(&frag.sql, params_from_iter(frag.params.iter()), |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    fn execute_remove(&self, query: &Query) -> Result<()> {
        let removed = self.execute(&render_delete(&self.table, &self.columns, query))?;
        log::debug!(target: "repokit::sql", "removed {removed} rows from {}", self.table);
        Ok(())
    }

    fn default_sorts(&self) -> Vec<Sort> {
        default_sorts(M::FIELDS, &self.primary_key)
    }
}

impl<M: Model, D: Model> Adapter for SqlAdapter<M, D> {
    type Record = M;

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    fn find_by_id(&self, id: &Value) -> Result<Option<D>> {
        let Some(key) = Self::key(id) else { return Ok(None) };
        let query = self.by_id(key)?.with_limit(1);
        Ok(self.select(&render_select(&self.table, &self.columns, &query))?.into_iter().next())
    }

    fn insert(&self, attrs: Attributes) -> Result<Value> {
        let mut attrs = normalize::<M>(attrs)?;
        attrs.remove(&self.primary_key);
        let table = quote_ident(&self.table);
        let sql = if attrs.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let cols: Vec<String> = attrs.keys().map(|c| quote_ident(c)).collect();
            format!("INSERT INTO {table} ({}) VALUES ({})", cols.join(", "), vec!["?"; cols.len()].join(", "))
        };
        query_trace!("{sql}");
        let conn = self.conn.lock();
        conn.execute(&sql, params_from_iter(attrs.values()))?;
        Ok(Value::Int(conn.last_insert_rowid()))
    }

    fn patch(&self, id: &Value, attrs: Attributes) -> Result<bool> {
        let Some(key) = Self::key(id) else { return Ok(false) };
        let mut attrs = coerce::<M>(attrs)?;
        attrs.remove(&self.primary_key);
        if attrs.is_empty() {
            return Ok(self.execute_count(&self.by_id(key)?)? > 0);
        }
        let sets: Vec<String> = attrs.keys().map(|c| format!("{} = ?", quote_ident(c))).collect();
        let mut params: Vec<Value> = attrs.into_values().collect();
        params.push(Value::Int(key));
        let frag = Fragment {
            sql: format!(
                "UPDATE {} SET {} WHERE {} = ?",
                quote_ident(&self.table),
                sets.join(", "),
                quote_ident(&self.primary_key)
            ),
            params,
        };
        Ok(self.execute(&frag)? > 0)
    }

    fn delete(&self, id: &Value) -> Result<bool> {
        let Some(key) = Self::key(id) else { return Ok(false) };
        let frag = render_delete(&self.table, &self.columns, &self.by_id(key)?);
        Ok(self.execute(&frag)? > 0)
    }
}

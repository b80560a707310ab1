use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::Model;
use crate::errors::{RepoError, Result};
use crate::types::Value;

/// Schema the relational adapter expects for [`User`]; schema management stays with the host.
#[must_use]
pub fn users_table_ddl(table: &str) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT,
    "age" INTEGER,
    "active" INTEGER,
    "opened_at" TEXT,
    "created_at" TEXT,
    "updated_at" TEXT
)"#,
        crate::adapters::sql::quote_ident(table)
    )
}

/// Demonstration model used by the CLI and the shared test suite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub id: Value,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub active: Option<bool>,
    pub opened_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self { name: Some(name.to_string()), ..Self::default() }
    }
}

fn mismatch(field: &str, expected: &str, value: &Value) -> RepoError {
    RepoError::Model(format!("{field} expects {expected} but got {}", value.inspect()))
}

fn text(field: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(mismatch(field, "text", &other)),
    }
}

fn int(field: &str, value: Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Int(i) => Ok(Some(i)),
        #[allow(clippy::cast_possible_truncation)]
        Value::Float(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
        Value::Text(ref s) => s.parse().map(Some).map_err(|_| mismatch(field, "an integer", &value)),
        other => Err(mismatch(field, "an integer", &other)),
    }
}

fn flag(field: &str, value: Value) -> Result<Option<bool>> {
    if value.is_null() {
        return Ok(None);
    }
    value.as_bool().map(Some).ok_or_else(|| mismatch(field, "a boolean", &value))
}

fn time(field: &str, value: Value) -> Result<Option<DateTime<Utc>>> {
    if value.is_null() {
        return Ok(None);
    }
    value.as_timestamp().map(Some).ok_or_else(|| mismatch(field, "a timestamp", &value))
}

impl Model for User {
    const FIELDS: &'static [&'static str] =
        &["id", "name", "age", "active", "opened_at", "created_at", "updated_at"];

    fn get(&self, field: &str) -> Option<Value> {
        Some(match field {
            "id" => self.id.clone(),
            "name" => self.name.clone().into(),
            "age" => self.age.into(),
            "active" => self.active.into(),
            "opened_at" => self.opened_at.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        })
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = value,
            "name" => self.name = text(field, value)?,
            "age" => self.age = int(field, value)?,
            "active" => self.active = flag(field, value)?,
            "opened_at" => self.opened_at = time(field, value)?,
            "created_at" => self.created_at = time(field, value)?,
            "updated_at" => self.updated_at = time(field, value)?,
            other => return Err(RepoError::invalid(format!("Unknown attribute: {other}"))),
        }
        Ok(())
    }
}

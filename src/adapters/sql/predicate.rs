//! Renders a [`Query`] as SQLite text with positional parameters. Values never appear in
//! the SQL itself.
//!
//! Rendering is driven by the table's [`Columns`]: a filter on a column the table lacks
//! folds to the constant the in-process evaluator gives for a null field, and a value of
//! another kind than the column holds never compares equal or ordered.

use crate::query::{Filter, Membership, Order, Query, Sort, matches};
use crate::types::{Attributes, Value};

const ALWAYS: &str = "1 = 1";
const NEVER: &str = "1 = 0";

/// Scalar function registered on every adapter connection: Unicode case-insensitive
/// substring test, false for anything but text.
pub const ICONTAINS: &str = "repokit_icontains";

/// SQL text plus the values bound to its `?` placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    fn text(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), params: Vec::new() }
    }

    fn bound(sql: String, value: Value) -> Self {
        Self { sql, params: vec![value] }
    }

    fn join(parts: Vec<Self>, sep: &str) -> Self {
        let mut params = Vec::new();
        let mut sql = Vec::with_capacity(parts.len());
        for part in parts {
            sql.push(part.sql);
            params.extend(part.params);
        }
        Self { sql: sql.join(sep), params }
    }

    fn wrap(self, template: impl FnOnce(&str) -> String) -> Self {
        Self { sql: template(&self.sql), params: self.params }
    }

    fn is_never(&self) -> bool {
        self.sql == NEVER
    }
}

/// The kind of value a column holds. Values of a different kind never match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Number,
    Text,
    Timestamp,
    /// No fixed kind; comparisons are guarded by the stored value's `typeof`.
    Any,
}

impl ColumnKind {
    /// Kind of a scalar; `None` for null and lists.
    #[must_use]
    pub const fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Bool),
            Value::Int(_) | Value::Float(_) => Some(Self::Number),
            Value::Text(_) => Some(Self::Text),
            Value::Timestamp(_) => Some(Self::Timestamp),
            Value::Null | Value::List(_) => None,
        }
    }

    const fn storage_classes(self) -> &'static str {
        match self {
            Self::Bool => "'integer'",
            Self::Number => "'integer', 'real'",
            Self::Text | Self::Timestamp => "'text'",
            Self::Any => "'integer', 'real', 'text'",
        }
    }
}

/// A table's columns in select order, each with the kind it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns(Vec<(String, ColumnKind)>);

impl Columns {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, ColumnKind)>) -> Self {
        Self(columns.into_iter().map(|(name, kind)| (name.into(), kind)).collect())
    }

    /// Columns without a fixed kind.
    #[must_use]
    pub fn untyped(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| (*n, ColumnKind::Any)))
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, k)| *k)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }
}

/// Double-quoted identifier with embedded quotes doubled.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn typed(col: &str, kind: ColumnKind, value_kind: ColumnKind) -> Option<String> {
    (kind == ColumnKind::Any).then(|| format!("typeof({col}) IN ({})", value_kind.storage_classes()))
}

/// `col op ?` for a non-null value, or [`NEVER`] when the kinds cannot meet.
fn compared(col: &str, kind: ColumnKind, op: &str, value: &Value) -> Fragment {
    match ColumnKind::of(value) {
        Some(vk) if kind == ColumnKind::Any || vk == kind => {
            let cmp = format!("{col} {op} ?");
            let sql = typed(col, kind, vk).map_or(cmp.clone(), |guard| format!("({cmp} AND {guard})"));
            Fragment::bound(sql, value.clone())
        }
        _ => Fragment::text(NEVER),
    }
}

fn not_equal(col: &str, kind: ColumnKind, value: &Value) -> Fragment {
    let hit = compared(col, kind, "=", value);
    if hit.is_never() {
        Fragment::text(ALWAYS)
    } else if kind == ColumnKind::Any {
        hit.wrap(|h| format!("({col} IS NULL OR NOT {h})"))
    } else {
        Fragment::bound(format!("({col} <> ? OR {col} IS NULL)"), value.clone())
    }
}

/// `col IN (...)` (or `NOT IN`) over the non-null members the column can hold, grouped by
/// kind; [`NEVER`] when there are none.
fn member_of(col: &str, kind: ColumnKind, values: Vec<Value>, keyword: &str) -> Fragment {
    let mut groups: Vec<(ColumnKind, Vec<Value>)> = Vec::new();
    for value in values {
        let Some(vk) = ColumnKind::of(&value) else { continue };
        if kind != ColumnKind::Any && vk != kind {
            continue;
        }
        match groups.iter_mut().find(|(k, _)| *k == vk) {
            Some((_, group)) => group.push(value),
            None => groups.push((vk, vec![value])),
        }
    }
    let mut parts: Vec<Fragment> = groups
        .into_iter()
        .map(|(vk, group)| {
            let list = format!("{col} {keyword} ({})", placeholders(group.len()));
            let sql = typed(col, kind, vk).map_or(list.clone(), |guard| format!("({list} AND {guard})"));
            Fragment { sql, params: group }
        })
        .collect();
    match parts.len() {
        0 => Fragment::text(NEVER),
        1 => parts.pop().unwrap_or_default(),
        _ => Fragment::join(parts, " OR ").wrap(|s| format!("({s})")),
    }
}

fn membership(col: &str, kind: ColumnKind, values: &[Value], negate: bool) -> Fragment {
    let Membership { values, has_null } = Membership::of(values);
    // A typed column holds a single kind, so its list can be negated in place.
    let direct = negate && kind != ColumnKind::Any;
    let hit = member_of(col, kind, values, if direct { "NOT IN" } else { "IN" });
    match (negate, has_null, hit.is_never()) {
        (false, false, _) => hit,
        (false, true, true) => Fragment::text(format!("{col} IS NULL")),
        (false, true, false) => hit.wrap(|h| format!("({h} OR {col} IS NULL)")),
        (true, false, true) => Fragment::text(ALWAYS),
        (true, true, true) => Fragment::text(format!("{col} IS NOT NULL")),
        (true, false, false) if direct => hit.wrap(|h| format!("({h} OR {col} IS NULL)")),
        (true, true, false) if direct => hit.wrap(|h| format!("({h} AND {col} IS NOT NULL)")),
        (true, false, false) => hit.wrap(|h| format!("({col} IS NULL OR NOT {h})")),
        (true, true, false) => hit.wrap(|h| format!("({col} IS NOT NULL AND NOT {h})")),
    }
}

fn group(filters: &[Filter], columns: &Columns, sep: &str, empty: &str) -> Fragment {
    if filters.is_empty() {
        return Fragment::text(empty);
    }
    let inner = Fragment::join(filters.iter().map(|f| render_filter(f, columns)).collect(), sep);
    inner.wrap(|s| format!("({s})"))
}

/// One predicate with null handling matching the in-process evaluator.
#[must_use]
pub fn render_filter(filter: &Filter, columns: &Columns) -> Fragment {
    let (col, kind) = match filter.field() {
        Some(field) => match columns.kind(field.as_str()) {
            Some(kind) => (quote_ident(field.as_str()), kind),
            None => {
                let absent = matches(filter, &Attributes::new());
                return Fragment::text(if absent { ALWAYS } else { NEVER });
            }
        },
        None => (String::new(), ColumnKind::Any),
    };
    match filter {
        Filter::Eq { value, .. } if value.is_null() => Fragment::text(format!("{col} IS NULL")),
        Filter::Eq { value, .. } => compared(&col, kind, "=", value),
        Filter::Neq { value, .. } if value.is_null() => Fragment::text(format!("{col} IS NOT NULL")),
        Filter::Neq { value, .. } => not_equal(&col, kind, value),
        Filter::Lt { value, .. } => compared(&col, kind, "<", value.get()),
        Filter::Lte { value, .. } => compared(&col, kind, "<=", value.get()),
        Filter::Gt { value, .. } => compared(&col, kind, ">", value.get()),
        Filter::Gte { value, .. } => compared(&col, kind, ">=", value.get()),
        Filter::In { values, .. } => membership(&col, kind, values, false),
        Filter::NotIn { values, .. } => membership(&col, kind, values, true),
        Filter::Like { pattern, .. } if matches!(kind, ColumnKind::Text | ColumnKind::Any) => {
            Fragment::bound(format!("{ICONTAINS}({col}, ?)"), Value::Text(pattern.clone()))
        }
        Filter::Like { .. } => Fragment::text(NEVER),
        Filter::And { filters } => group(filters, columns, " AND ", ALWAYS),
        Filter::Or { filters } => group(filters, columns, " OR ", NEVER),
    }
}

/// ` WHERE a AND b`, or nothing for an empty filter list.
#[must_use]
pub fn render_where(filters: &[Filter], columns: &Columns) -> Fragment {
    if filters.is_empty() {
        return Fragment::default();
    }
    let joined = Fragment::join(filters.iter().map(|f| render_filter(f, columns)).collect(), " AND ");
    joined.wrap(|s| format!(" WHERE {s}"))
}

/// Sorts on columns the table lacks order nothing and are left out.
#[must_use]
pub fn render_order(sorts: &[Sort], columns: &Columns) -> String {
    let keys: Vec<String> = sorts
        .iter()
        .filter(|s| columns.kind(s.field.as_str()).is_some())
        .map(|s| {
            let dir = if s.order == Order::Asc { "ASC" } else { "DESC" };
            format!("{} {dir}", quote_ident(s.field.as_str()))
        })
        .collect();
    if keys.is_empty() {
        return String::new();
    }
    format!(" ORDER BY {}", keys.join(", "))
}

fn render_paging(query: &Query) -> Fragment {
    let n = |v: u64| Value::Int(i64::try_from(v).unwrap_or(i64::MAX));
    match (query.limit, query.offset) {
        (Some(l), Some(o)) => Fragment { sql: " LIMIT ? OFFSET ?".into(), params: vec![n(l), n(o)] },
        (Some(l), None) => Fragment::bound(" LIMIT ?".into(), n(l)),
        (None, Some(o)) => Fragment::bound(" LIMIT -1 OFFSET ?".into(), n(o)),
        (None, None) => Fragment::default(),
    }
}

/// Selects every column of `columns`, in order.
#[must_use]
pub fn render_select(table: &str, columns: &Columns, query: &Query) -> Fragment {
    let cols: Vec<String> = columns.names().map(quote_ident).collect();
    let filter = render_where(&query.filters, columns);
    let paging = render_paging(query);
    let sql = format!(
        "SELECT {} FROM {}{}{}{}",
        cols.join(", "),
        quote_ident(table),
        filter.sql,
        render_order(&query.sorts, columns),
        paging.sql
    );
    let mut params = filter.params;
    params.extend(paging.params);
    Fragment { sql, params }
}

#[must_use]
pub fn render_count(table: &str, columns: &Columns, query: &Query) -> Fragment {
    render_where(&query.filters, columns).wrap(|w| format!("SELECT COUNT(*) FROM {}{w}", quote_ident(table)))
}

#[must_use]
pub fn render_delete(table: &str, columns: &Columns, query: &Query) -> Fragment {
    render_where(&query.filters, columns).wrap(|w| format!("DELETE FROM {}{w}", quote_ident(table)))
}

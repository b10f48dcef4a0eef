//! INSERT / REPLACE / UPDATE / DELETE statement builders.
//!
//! These functions only produce a [`Fragment`]; [`Db`](crate::Db) runs them.

use crate::error::{DbError, DbResult};
use crate::fragment::{Fragment, FragmentKind};
use crate::value::Value;
use chrono::FixedOffset;

/// A column value in [`Data`].
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Sent as a driver-bound `?` parameter.
    Bind(Value),
    /// Escaped and written into the statement text, e.g. `views + 1`.
    Inline(Fragment),
}

impl From<Value> for Column {
    fn from(value: Value) -> Self {
        Column::Bind(value)
    }
}

impl From<Fragment> for Column {
    fn from(fragment: Fragment) -> Self {
        Column::Inline(fragment)
    }
}

/// Ordered column data for writes.
///
/// Columns keep insertion order; setting an existing column replaces its value in
/// place.
///
/// ```ignore
/// use sqlframe::{Data, Fragment, args};
///
/// let mut data = Data::new();
/// data.set("title", "hello")
///     .set("author_id", 3)
///     .set_raw("views", Fragment::raw("views + ?", args![1]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    columns: Vec<(String, Column)>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column bound as a parameter.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.put(column.into(), Column::Bind(value.into()))
    }

    /// Set a column written inline from an escaped fragment.
    pub fn set_raw(&mut self, column: impl Into<String>, fragment: Fragment) -> &mut Self {
        self.put(column.into(), Column::Inline(fragment))
    }

    fn put(&mut self, column: String, value: Column) -> &mut Self {
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Data::new();
        for (column, value) in iter {
            data.set(column, value);
        }
        data
    }
}

/// Row selector for UPDATE and DELETE.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// Match the primary key: `id=?`.
    Id(Value),
    /// A predicate written as-is, with `?` placeholders for the caller's args.
    Sql(String),
}

macro_rules! impl_where_id {
    ($($t:ty),*) => {
        $(impl From<$t> for Where {
            fn from(id: $t) -> Self {
                Where::Id(Value::from(id))
            }
        })*
    };
}

impl_where_id!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<&str> for Where {
    fn from(sql: &str) -> Self {
        Where::Sql(sql.to_string())
    }
}

impl From<String> for Where {
    fn from(sql: String) -> Self {
        Where::Sql(sql)
    }
}

impl From<&String> for Where {
    fn from(sql: &String) -> Self {
        Where::Sql(sql.clone())
    }
}

impl Where {
    /// Resolve to predicate text and its leading argument.
    fn resolve(&self, table: &str) -> DbResult<(String, Option<Value>)> {
        match self {
            Where::Id(id) => Ok(("id=?".to_string(), Some(id.clone()))),
            Where::Sql(sql) => {
                let sql = sql.trim();
                if sql.is_empty() {
                    return Err(DbError::MissingWhere(table.to_string()));
                }
                Ok((sql.to_string(), None))
            }
        }
    }
}

/// Write verb for [`build_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertVerb {
    Insert,
    Replace,
}

impl InsertVerb {
    fn keyword(self) -> &'static str {
        match self {
            InsertVerb::Insert => "insert",
            InsertVerb::Replace => "replace",
        }
    }
}

/// Backtick-quote a table or column name.
pub fn quote_ident(name: &str) -> String {
    format!("`{name}`")
}

/// `insert into `t` (`a`,`b`) values (?,…)`. Inline columns are escaped with `tz`.
pub fn build_insert(
    verb: InsertVerb,
    table: &str,
    data: &Data,
    tz: &FixedOffset,
) -> DbResult<Fragment> {
    if data.is_empty() {
        return Err(DbError::NoColumns(table.to_string()));
    }
    let mut names = Vec::with_capacity(data.len());
    let mut slots = Vec::with_capacity(data.len());
    let mut args = Vec::new();
    for (column, value) in data.iter() {
        names.push(quote_ident(column));
        match value {
            Column::Bind(v) => {
                slots.push("?".to_string());
                args.push(v.clone());
            }
            Column::Inline(fragment) => slots.push(fragment.try_format_inline(tz)?),
        }
    }
    let sql = format!(
        "{} into {} ({}) values ({})",
        verb.keyword(),
        quote_ident(table),
        names.join(","),
        slots.join(",")
    );
    Ok(Fragment::new(sql, FragmentKind::Sql, args))
}

/// `update `t` set `a`=?,… where W`.
///
/// Parameters are the assignment values, then the id (for [`Where::Id`]), then `args`.
pub fn build_update(
    table: &str,
    data: &Data,
    where_: &Where,
    args: &[Value],
    tz: &FixedOffset,
) -> DbResult<Fragment> {
    let (predicate, id) = where_.resolve(table)?;
    if data.is_empty() {
        return Err(DbError::NoColumns(table.to_string()));
    }
    let mut assignments = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len() + args.len() + 1);
    for (column, value) in data.iter() {
        match value {
            Column::Bind(v) => {
                assignments.push(format!("{}=?", quote_ident(column)));
                params.push(v.clone());
            }
            Column::Inline(fragment) => assignments.push(format!(
                "{}={}",
                quote_ident(column),
                fragment.try_format_inline(tz)?
            )),
        }
    }
    params.extend(id);
    params.extend_from_slice(args);
    let sql = format!(
        "update {} set {} where {predicate}",
        quote_ident(table),
        assignments.join(",")
    );
    Ok(Fragment::new(sql, FragmentKind::Sql, params))
}

/// `delete from `t` where W`.
pub fn build_delete(table: &str, where_: &Where, args: &[Value]) -> DbResult<Fragment> {
    let (predicate, id) = where_.resolve(table)?;
    let mut params: Vec<Value> = id.into_iter().collect();
    params.extend_from_slice(args);
    let sql = format!("delete from {} where {predicate}", quote_ident(table));
    Ok(Fragment::new(sql, FragmentKind::Sql, params))
}

//! Row materialization.
//!
//! Query results are turned into [`Record`]s: a column name → [`Field`] map where the
//! field variant is picked from the column's declared database type, not from the
//! cell. NULL and undecodable cells become the zero value of that type, so a record
//! never contains nulls.

use crate::value::{Value, zero_time};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Typed access to one result row, implemented by driver row types.
///
/// Accessors return `None` for NULL or for a cell that cannot be read as the
/// requested type.
pub trait RowSource {
    fn column_count(&self) -> usize;

    fn column_name(&self, idx: usize) -> &str;

    /// Declared type name as reported by the driver, e.g. `INT UNSIGNED` or `DATETIME`.
    fn column_type(&self, idx: usize) -> &str;

    fn get_int(&self, idx: usize) -> Option<i64>;

    fn get_float(&self, idx: usize) -> Option<f64>;

    fn get_time(&self, idx: usize) -> Option<DateTime<Utc>>;

    fn get_bytes(&self, idx: usize) -> Option<Vec<u8>>;

    fn get_string(&self, idx: usize) -> Option<String>;
}

/// Category of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Time,
    Bytes,
    Str,
}

impl ColumnKind {
    /// Classify a declared type name. Unknown types are read as strings.
    pub fn from_type_name(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("");
        match base {
            "INT" | "TINYINT" | "INTEGER" | "BIGINT" | "SMALLINT" | "MEDIUMINT" | "BOOLEAN"
            | "BOOL" | "YEAR" => ColumnKind::Int,
            "FLOAT" | "DOUBLE" | "DECIMAL" | "REAL" | "NUMERIC" => ColumnKind::Float,
            "DATETIME" | "SMALLDATETIME" | "DATE" | "TIMESTAMP" => ColumnKind::Time,
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
                ColumnKind::Bytes
            }
            _ => ColumnKind::Str,
        }
    }
}

/// A materialized cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Str(String),
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl Field {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Field::Int(v) => Some(*v),
            Field::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Float(v) => Some(*v),
            Field::Int(v) => Some(*v as f64),
            Field::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Field::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Field::Bytes(b) => Some(b),
            Field::Str(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

/// One result row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(HashMap<String, Field>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, field: Field) -> Option<Field> {
        self.0.insert(column.into(), field)
    }

    pub fn get(&self, column: &str) -> Option<&Field> {
        self.0.get(column)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Field::as_i64)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Field::as_f64)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Field::as_str)
    }

    pub fn get_time(&self, column: &str) -> Option<&DateTime<Utc>> {
        self.get(column).and_then(Field::as_time)
    }

    pub fn get_bytes(&self, column: &str) -> Option<&[u8]> {
        self.get(column).and_then(Field::as_bytes)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> HashMap<String, Field> {
        self.0
    }
}

impl IntoIterator for Record {
    type Item = (String, Field);
    type IntoIter = std::collections::hash_map::IntoIter<String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Read every column of `row` into a [`Record`].
pub fn materialize<R: RowSource + ?Sized>(row: &R) -> Record {
    let count = row.column_count();
    let mut fields = HashMap::with_capacity(count);
    for idx in 0..count {
        let field = match ColumnKind::from_type_name(row.column_type(idx)) {
            ColumnKind::Int => Field::Int(row.get_int(idx).unwrap_or(0)),
            ColumnKind::Float => Field::Float(row.get_float(idx).unwrap_or(0.0)),
            ColumnKind::Time => Field::Time(row.get_time(idx).unwrap_or_else(zero_time)),
            ColumnKind::Bytes => Field::Bytes(row.get_bytes(idx).unwrap_or_default()),
            ColumnKind::Str => Field::Str(row.get_string(idx).unwrap_or_default()),
        };
        fields.insert(row.column_name(idx).to_string(), field);
    }
    Record(fields)
}

/// An in-memory row, for custom drivers and tests.
///
/// ```ignore
/// let row = RawRow::new()
///     .column("id", "BIGINT", 7)
///     .column("name", "VARCHAR", "alice");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<RawColumn>,
}

#[derive(Debug, Clone, PartialEq)]
struct RawColumn {
    name: String,
    type_name: String,
    value: Value,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column with its declared type name.
    pub fn column(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.columns.push(RawColumn {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
        });
        self
    }

    fn value(&self, idx: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.columns.get(idx).map_or(&NULL, |column| &column.value)
    }
}

impl RowSource for RawRow {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, idx: usize) -> &str {
        self.columns.get(idx).map_or("", |c| c.name.as_str())
    }

    fn column_type(&self, idx: usize) -> &str {
        self.columns.get(idx).map_or("", |c| c.type_name.as_str())
    }

    fn get_int(&self, idx: usize) -> Option<i64> {
        match self.value(idx) {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn get_float(&self, idx: usize) -> Option<f64> {
        match self.value(idx) {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn get_time(&self, idx: usize) -> Option<DateTime<Utc>> {
        match self.value(idx) {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    fn get_bytes(&self, idx: usize) -> Option<Vec<u8>> {
        match self.value(idx) {
            Value::Bytes(b) | Value::Raw(b) => Some(b.clone()),
            Value::Str(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }

    fn get_string(&self, idx: usize) -> Option<String> {
        match self.value(idx) {
            Value::Str(s) => Some(s.clone()),
            Value::Int(v) => Some(v.to_string()),
            Value::UInt(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            Value::Bytes(b) | Value::Raw(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::Timestamp(t) => Some(t.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::Null | Value::List(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn type_names_map_to_kinds() {
        assert_eq!(ColumnKind::from_type_name("INT UNSIGNED"), ColumnKind::Int);
        assert_eq!(ColumnKind::from_type_name("bigint"), ColumnKind::Int);
        assert_eq!(ColumnKind::from_type_name("BOOLEAN"), ColumnKind::Int);
        assert_eq!(ColumnKind::from_type_name("DECIMAL(10,2)"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_type_name("DOUBLE"), ColumnKind::Float);
        assert_eq!(ColumnKind::from_type_name("DATETIME"), ColumnKind::Time);
        assert_eq!(ColumnKind::from_type_name("TIMESTAMP"), ColumnKind::Time);
        assert_eq!(ColumnKind::from_type_name("LONGBLOB"), ColumnKind::Bytes);
        assert_eq!(ColumnKind::from_type_name("VARCHAR"), ColumnKind::Str);
        assert_eq!(ColumnKind::from_type_name("TIME"), ColumnKind::Str);
        assert_eq!(ColumnKind::from_type_name("JSON"), ColumnKind::Str);
    }

    #[test]
    fn materialize_reads_by_declared_type() {
        let t = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let row = RawRow::new()
            .column("id", "BIGINT", 7)
            .column("price", "DECIMAL", "12.50")
            .column("created_at", "DATETIME", t)
            .column("name", "VARCHAR", "alice")
            .column("avatar", "BLOB", vec![1u8, 2]);
        let record = materialize(&row);

        assert_eq!(record.len(), 5);
        assert_eq!(record.get("id"), Some(&Field::Int(7)));
        assert_eq!(record.get("price"), Some(&Field::Float(12.5)));
        assert_eq!(record.get_time("created_at"), Some(&t));
        assert_eq!(record.get_str("name"), Some("alice"));
        assert_eq!(record.get_bytes("avatar"), Some(&[1u8, 2][..]));
    }

    #[test]
    fn nulls_become_zero_values() {
        let row = RawRow::new()
            .column("a", "INT", None::<i64>)
            .column("b", "FLOAT", None::<f64>)
            .column("c", "DATE", None::<i64>)
            .column("d", "TEXT", None::<String>)
            .column("e", "VARBINARY", None::<Vec<u8>>);
        let record = materialize(&row);

        assert_eq!(record.get("a"), Some(&Field::Int(0)));
        assert_eq!(record.get("b"), Some(&Field::Float(0.0)));
        assert_eq!(record.get_time("c"), Some(&zero_time()));
        assert_eq!(record.get("d"), Some(&Field::Str(String::new())));
        assert_eq!(record.get("e"), Some(&Field::Bytes(Vec::new())));
    }

    #[test]
    fn undecodable_cells_become_zero_values() {
        let row = RawRow::new().column("n", "INT", "not a number");
        assert_eq!(materialize(&row).get_i64("n"), Some(0));
    }

    #[test]
    fn record_serializes_as_plain_map() {
        let mut record = Record::new();
        record.insert("id", Field::Int(3));
        record.insert("name", Field::Str("x".into()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "name": "x"}));
    }
}

//! Positional argument values.
//!
//! [`Value`] is the closed set of things that can stand behind a `?` placeholder,
//! either bound as a driver parameter or inlined through [`escape`](crate::escape).

use chrono::{DateTime, TimeZone, Utc};

/// Seconds from the Unix epoch to `0001-01-01 00:00:00 UTC`.
pub const ZERO_TIME_SECS: i64 = -62_135_596_800;

/// The "unset" timestamp sentinel, `0001-01-01 00:00:00 UTC`.
///
/// Escaping renders it as `'0000-00-00'`, and row materialization uses it for NULL
/// temporal cells.
pub fn zero_time() -> DateTime<Utc> {
    DateTime::from_timestamp(ZERO_TIME_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whether `t` is the [`zero_time`] sentinel.
pub fn is_zero_time(t: &DateTime<Utc>) -> bool {
    t.timestamp() == ZERO_TIME_SECS && t.timestamp_subsec_nanos() == 0
}

/// A single positional argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    /// Pre-encoded payload (e.g. JSON text) written as a quoted string literal.
    Raw(Vec<u8>),
    /// Argument list for `[?]` expansion in [`Condition::search`](crate::Condition::search).
    ///
    /// Lists cannot be escaped or bound directly.
    List(Vec<Value>),
}

impl Value {
    /// Build a [`Value::List`] from any iterator of convertible items.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a [`Value::Raw`] payload.
    pub fn raw(payload: impl Into<Vec<u8>>) -> Self {
        Value::Raw(payload.into())
    }

    /// Short variant name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Raw(_) => "raw",
            Value::List(_) => "list",
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::Timestamp(v.with_timezone(&Utc))
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Raw(v.to_string().into_bytes())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Build a `Vec<Value>` from heterogeneous arguments.
///
/// ```ignore
/// use sqlframe::args;
///
/// let args = args![5, "alice", None::<i32>];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn integer_widths_keep_signedness() {
        assert_eq!(Value::from(-3i8), Value::Int(-3));
        assert_eq!(Value::from(7u16), Value::UInt(7));
        assert_eq!(Value::from(u64::MAX), Value::UInt(u64::MAX));
        assert_eq!(Value::from(-1isize), Value::Int(-1));
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
        assert_eq!(Value::from(None::<Vec<u8>>), Value::Null);
    }

    #[test]
    fn timestamps_are_normalized_to_utc() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = tz.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        match Value::from(local) {
            Value::Timestamp(t) => {
                assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_time_round_trips() {
        let z = zero_time();
        assert!(is_zero_time(&z));
        assert_eq!(z.format("%Y-%m-%d %H:%M:%S").to_string(), "0001-01-01 00:00:00");
        assert!(!is_zero_time(&DateTime::<Utc>::UNIX_EPOCH));
    }

    #[test]
    fn json_becomes_raw_text() {
        let v = Value::from(serde_json::json!({"a": 1}));
        assert_eq!(v, Value::Raw(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn args_macro_converts_each_item() {
        let a = crate::args![1, "x", true, None::<i64>];
        assert_eq!(
            a,
            vec![
                Value::Int(1),
                Value::Str("x".into()),
                Value::Bool(true),
                Value::Null
            ]
        );
        assert!(crate::args![].is_empty());
    }
}

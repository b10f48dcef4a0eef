//! SQL literal escaping.
//!
//! [`escape`] substitutes each `?` in a statement with the literal form of the matching
//! [`Value`]. It is the only place where caller data is written directly into SQL text,
//! so every variant has an explicit rule and anything that cannot be expressed as a
//! MySQL literal is rejected instead of being guessed at.

use crate::error::{DbError, DbResult};
use crate::value::{Value, is_zero_time};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::fmt::Write as _;

/// Default offset for timestamp literals (UTC+8).
pub const DEFAULT_TIMEZONE_SECS: i32 = 8 * 3600;

/// The default zone used by [`escape`].
pub fn default_timezone() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_TIMEZONE_SECS).unwrap_or_else(|| Utc.fix())
}

/// Number of `?` placeholders in `sql`.
pub fn placeholder_count(sql: &str) -> usize {
    sql.bytes().filter(|b| *b == b'?').count()
}

/// Number of `?` placeholders outside quoted literals and identifiers.
///
/// This is what the server binds against, so text produced by [`escape`] (which
/// may contain `?` inside a string literal) still counts correctly.
pub fn bound_placeholder_count(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<u8> = None;
    let mut bytes = sql.bytes();
    while let Some(b) = bytes.next() {
        match quote {
            Some(q) if b == b'\\' && q != b'`' => {
                bytes.next();
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'?' => count += 1,
                _ => {}
            },
        }
    }
    count
}

/// Inline `args` into `sql` using the default timezone.
///
/// ```ignore
/// use sqlframe::{args, escape};
///
/// let sql = escape("name=? and age>?", &args!["O'Brien", 30])?;
/// assert_eq!(sql, r"name='O\'Brien' and age>30");
/// ```
pub fn escape(sql: &str, args: &[Value]) -> DbResult<String> {
    escape_with(sql, args, &default_timezone())
}

/// Inline `args` into `sql`, formatting timestamps in `tz`.
///
/// Fails with [`DbError::ArgumentCountMismatch`] when the number of `?` differs from
/// `args.len()`, and with [`DbError::UnsupportedValueType`] for values that have no
/// literal form.
pub fn escape_with(sql: &str, args: &[Value], tz: &FixedOffset) -> DbResult<String> {
    let placeholders = placeholder_count(sql);
    if placeholders != args.len() {
        return Err(DbError::ArgumentCountMismatch {
            placeholders,
            args: args.len(),
        });
    }
    if args.is_empty() {
        return Ok(sql.to_string());
    }

    let mut out = String::with_capacity(sql.len() + args.len() * 8);
    let mut rest = sql;
    for arg in args {
        // Counted above, so every arg has a placeholder.
        let Some(pos) = rest.find('?') else {
            break;
        };
        out.push_str(&rest[..pos]);
        write_literal(&mut out, arg, tz)?;
        rest = &rest[pos + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Append the literal form of a single value.
pub fn write_literal(out: &mut String, value: &Value, tz: &FixedOffset) -> DbResult<()> {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Value::UInt(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Float(v) => {
            if !v.is_finite() {
                return Err(DbError::UnsupportedValueType(format!(
                    "non-finite {} {v} has no SQL literal",
                    value.type_name()
                )));
            }
            let _ = write!(out, "{v}");
        }
        Value::Bool(v) => out.push(if *v { '1' } else { '0' }),
        Value::Timestamp(t) => write_timestamp(out, t, tz),
        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str("_binary'");
                escape_str_into(out, text);
                out.push('\'');
            }
            Err(_) => {
                out.push_str("_binary X'");
                write_hex(out, bytes);
                out.push('\'');
            }
        },
        Value::Raw(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => quote_into(out, text),
            Err(_) => {
                out.push_str("X'");
                write_hex(out, bytes);
                out.push('\'');
            }
        },
        Value::Str(s) => quote_into(out, s),
        Value::List(_) => {
            return Err(DbError::UnsupportedValueType(format!(
                "{} values can only be expanded through a [?] search marker",
                value.type_name()
            )));
        }
    }
    Ok(())
}

fn write_timestamp(out: &mut String, t: &DateTime<Utc>, tz: &FixedOffset) {
    if is_zero_time(t) {
        out.push_str("'0000-00-00'");
        return;
    }
    let _ = write!(
        out,
        "'{}'",
        t.with_timezone(tz).format("%Y-%m-%d %H:%M:%S")
    );
}

fn write_hex(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
}

fn quote_into(out: &mut String, s: &str) {
    out.push('\'');
    escape_str_into(out, s);
    out.push('\'');
}

fn escape_str_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
}

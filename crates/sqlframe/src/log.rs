//! `tracing` integration: statement debug events and builder warnings.
//!
//! Every helper compiles to nothing without the `tracing` feature.

/// Default maximum SQL length (in bytes) written to a log event.
pub const MAX_LOGGED_SQL: usize = 200;

/// The type of SQL operation being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Replace,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Classify a statement by its first keyword.
    pub fn from_sql(sql: &str) -> Self {
        let head = sql
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        match head.to_ascii_lowercase().as_str() {
            "select" => Self::Select,
            "insert" => Self::Insert,
            "replace" => Self::Replace,
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Other,
        }
    }
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(feature = "tracing")]
pub(crate) fn statement(sql: &str, param_count: usize) {
    let kind = StatementKind::from_sql(sql);
    let sql: std::borrow::Cow<'_, str> = if sql.len() > MAX_LOGGED_SQL {
        format!("{}...", truncate_sql_bytes(sql, MAX_LOGGED_SQL)).into()
    } else {
        sql.into()
    };
    tracing::debug!(target: "sqlframe.sql", statement = ?kind, param_count, sql = %sql);
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn statement(_sql: &str, _param_count: usize) {}

#[cfg(feature = "tracing")]
pub(crate) fn builder_warning(message: &str, sql: &str, reason: &dyn std::fmt::Display) {
    let sql = truncate_sql_bytes(sql, MAX_LOGGED_SQL);
    tracing::warn!(target: "sqlframe.builder", sql = %sql, reason = %reason, "{message}");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn builder_warning(_message: &str, _sql: &str, _reason: &dyn std::fmt::Display) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_keyword() {
        assert_eq!(StatementKind::from_sql("select 1"), StatementKind::Select);
        assert_eq!(
            StatementKind::from_sql("  (select a) union (select b)"),
            StatementKind::Select
        );
        assert_eq!(StatementKind::from_sql("REPLACE into `t`"), StatementKind::Replace);
        assert_eq!(StatementKind::from_sql("delete from `t`"), StatementKind::Delete);
        assert_eq!(StatementKind::from_sql("show tables"), StatementKind::Other);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("abc", 10), "abc");
        assert_eq!(truncate_sql_bytes("abcdef", 3), "abc");
        // "é" is two bytes
        assert_eq!(truncate_sql_bytes("aé", 2), "a");
    }
}

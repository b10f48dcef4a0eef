//! SQL text fragments with positional arguments.

use crate::error::{DbError, DbResult};
use crate::escape::{default_timezone, escape_with, placeholder_count};
use crate::value::Value;
use chrono::FixedOffset;

/// Role of a [`Fragment`] inside a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Where,
    Field,
    Order,
    Group,
    Join,
    Union,
    UnionAll,
    Raw,
    Sql,
}

/// A piece of SQL text plus the arguments for its `?` placeholders.
///
/// Fragments are plain values: building one never touches the database, and the
/// placeholder/argument invariant is only enforced when the fragment is escaped or
/// handed to a driver ([`Fragment::validate`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    sql: String,
    args: Vec<Value>,
    kind: FragmentKind,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, kind: FragmentKind, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
            kind,
        }
    }

    /// A [`FragmentKind::Raw`] fragment, typically used as an inline column value
    /// such as `views + ?`.
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(sql, FragmentKind::Raw, args)
    }

    /// An empty fragment of the given kind.
    pub fn empty(kind: FragmentKind) -> Self {
        Self::new(String::new(), kind, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    /// Append trimmed text separated by a single space, extending the arguments.
    pub fn append(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        let sql = sql.trim();
        if !sql.is_empty() {
            if !self.sql.is_empty() {
                self.sql.push(' ');
            }
            self.sql.push_str(sql);
        }
        self.args.extend(args);
        self
    }

    /// Number of `?` placeholders in the text.
    pub fn placeholder_count(&self) -> usize {
        placeholder_count(&self.sql)
    }

    /// Check that every placeholder has exactly one argument.
    pub fn validate(&self) -> DbResult<()> {
        let placeholders = self.placeholder_count();
        if placeholders != self.args.len() {
            return Err(DbError::ArgumentCountMismatch {
                placeholders,
                args: self.args.len(),
            });
        }
        Ok(())
    }

    /// Inline the arguments as literals, formatting timestamps in `tz`.
    pub fn try_format_inline(&self, tz: &FixedOffset) -> DbResult<String> {
        escape_with(&self.sql, &self.args, tz)
    }

    /// Inline the arguments as literals using the default timezone.
    ///
    /// Returns an empty string when escaping fails. Callers that need the failure
    /// should use [`Fragment::try_format_inline`].
    pub fn format_inline(&self) -> String {
        match self.try_format_inline(&default_timezone()) {
            Ok(sql) => sql,
            Err(err) => {
                crate::log::builder_warning("inline formatting failed", &self.sql, &err);
                String::new()
            }
        }
    }
}

//! Predicate lists joined with `and`/`or`.
//!
//! A [`Condition`] collects WHERE/HAVING clauses one at a time. Clauses keep their
//! own leading connective (`or x = ?`); clauses without one are joined with `and`.
//!
//! # Example
//!
//! ```ignore
//! use sqlframe::{Condition, SearchPolicy, args};
//!
//! let mut inner = Condition::or();
//! inner.where_("name like ?", args!["a%"]).where_("or name like ?", args!["b%"]);
//!
//! let mut cond = Condition::new();
//! cond.where_("status = ?", args![1])
//!     .search("category_id = ?", form.category, SearchPolicy::WithoutZero)
//!     .where_condition(&inner);
//! // status = ? or (name like ? or name like ?)
//! ```

use crate::fragment::{Fragment, FragmentKind};
use crate::value::Value;

/// How [`Condition::search`] decides whether a value counts as "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPolicy {
    /// Skip null, empty strings and empty lists. Numeric zero and `false` are kept.
    #[default]
    WithoutEmpty,
    /// Skip null, empty strings, empty lists, numeric zero and `false`.
    WithoutZero,
    /// Skip only null and empty lists.
    WithoutNil,
}

/// Connective a nested condition carries when merged with
/// [`Condition::where_condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
    /// No connective; the nested group is joined with `and` like any plain clause.
    Bare,
}

impl Connective {
    fn keyword(self) -> Option<&'static str> {
        match self {
            Connective::And => Some("and"),
            Connective::Or => Some("or"),
            Connective::Bare => None,
        }
    }
}

/// List-expansion marker accepted by [`Condition::search`].
pub const LIST_MARKER: &str = "[?]";

/// Ordered predicate clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    connective: Connective,
    items: Vec<Fragment>,
}

impl Condition {
    /// An empty condition that nests as `and (...)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty condition that nests as `or (...)`.
    pub fn or() -> Self {
        Self::with_connective(Connective::Or)
    }

    /// An empty condition that nests as a bare `(...)`.
    pub fn bare() -> Self {
        Self::with_connective(Connective::Bare)
    }

    pub fn with_connective(connective: Connective) -> Self {
        Self {
            connective,
            items: Vec::new(),
        }
    }

    pub fn connective(&self) -> Connective {
        self.connective
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add a clause. Blank SQL is ignored.
    pub fn where_(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        let sql = sql.trim();
        if sql.is_empty() {
            return self;
        }
        self.items.push(Fragment::new(sql, FragmentKind::Where, args));
        self
    }

    /// Nest another condition as a parenthesized group.
    ///
    /// The group is prefixed with `other`'s connective, so `Condition::or()` produces
    /// `or (...)`. An empty `other` is ignored.
    pub fn where_condition(&mut self, other: &Condition) -> &mut Self {
        let combined = other.get_fragment();
        if combined.is_empty() {
            return self;
        }
        let (sql, args) = combined.into_parts();
        let inner = strip_leading_connective(&sql).unwrap_or(&sql);
        let group = match other.connective.keyword() {
            Some(keyword) => format!("{keyword} ({inner})"),
            None => format!("({inner})"),
        };
        self.items.push(Fragment::new(group, FragmentKind::Where, args));
        self
    }

    /// Add a clause only when `value` is present under `policy`.
    ///
    /// A [`Value::List`] expands the single `[?]` marker in `sql` to one placeholder per
    /// element. SQL without exactly one marker drops the clause. Bytes, timestamps and
    /// raw payloads are never treated as search values.
    pub fn search(
        &mut self,
        sql: &str,
        value: impl Into<Value>,
        policy: SearchPolicy,
    ) -> &mut Self {
        let value = value.into();
        if !is_present(&value, policy) {
            return self;
        }
        match value {
            Value::List(items) => {
                if sql.matches(LIST_MARKER).count() != 1 {
                    crate::log::builder_warning(
                        "search clause dropped",
                        sql,
                        &"list value requires exactly one [?] marker",
                    );
                    return self;
                }
                let group = vec!["?"; items.len()].join(",");
                let sql = sql.replacen(LIST_MARKER, &group, 1);
                self.where_(&sql, items)
            }
            scalar => self.where_(sql, vec![scalar]),
        }
    }

    /// Combine all clauses into one fragment (not parenthesized).
    ///
    /// The first clause loses any leading connective; later clauses get `and` unless
    /// they already start with `and`/`or`.
    pub fn get_fragment(&self) -> Fragment {
        let mut sql = String::new();
        let mut args = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            let text = item.sql();
            if i == 0 {
                sql.push_str(strip_leading_connective(text).unwrap_or(text));
            } else {
                sql.push(' ');
                if strip_leading_connective(text).is_none() {
                    sql.push_str("and ");
                }
                sql.push_str(text);
            }
            args.extend_from_slice(item.args());
        }
        Fragment::new(sql, FragmentKind::Where, args)
    }

    /// Remove every clause, keeping the connective.
    pub fn clear(&mut self) -> &mut Self {
        self.items.clear();
        self
    }
}

fn is_present(value: &Value, policy: SearchPolicy) -> bool {
    match value {
        Value::Null => false,
        Value::List(items) => !items.is_empty(),
        Value::Str(s) => policy == SearchPolicy::WithoutNil || !s.is_empty(),
        Value::Int(v) => policy != SearchPolicy::WithoutZero || *v != 0,
        Value::UInt(v) => policy != SearchPolicy::WithoutZero || *v != 0,
        Value::Float(v) => policy != SearchPolicy::WithoutZero || *v != 0.0,
        Value::Bool(v) => policy != SearchPolicy::WithoutZero || *v,
        Value::Bytes(_) | Value::Timestamp(_) | Value::Raw(_) => false,
    }
}

/// If `sql` starts with `and`/`or` (any case) followed by whitespace, return the rest.
pub(crate) fn strip_leading_connective(sql: &str) -> Option<&str> {
    ["and", "or"].into_iter().find_map(|keyword| {
        let head = sql.get(..keyword.len())?;
        if !head.eq_ignore_ascii_case(keyword) {
            return None;
        }
        let rest = &sql[keyword.len()..];
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        Some(rest.trim_start())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn empty_condition_gives_empty_fragment() {
        let f = Condition::new().get_fragment();
        assert_eq!(f.sql(), "");
        assert!(f.args().is_empty());
    }

    #[test]
    fn clauses_join_with_and_unless_prefixed() {
        let mut c = Condition::new();
        c.where_("or a = ?", args![1])
            .where_("b = ?", args![2])
            .where_("OR c = ?", args![3])
            .where_("   ", args![]);
        let f = c.get_fragment();
        assert_eq!(f.sql(), "a = ? and b = ? OR c = ?");
        assert_eq!(f.args(), &args![1, 2, 3][..]);
    }

    #[test]
    fn connective_needs_trailing_whitespace() {
        assert_eq!(strip_leading_connective("and x"), Some("x"));
        assert_eq!(strip_leading_connective("OR\tx"), Some("x"));
        assert_eq!(strip_leading_connective("order_id = 1"), None);
        assert_eq!(strip_leading_connective("android = 1"), None);
        assert_eq!(strip_leading_connective("and"), None);
    }

    #[test]
    fn column_named_like_connective_gets_and() {
        let mut c = Condition::new();
        c.where_("a = 1", args![]).where_("order_no = ?", args!["x"]);
        assert_eq!(c.get_fragment().sql(), "a = 1 and order_no = ?");
    }

    #[test]
    fn nested_condition_is_parenthesized() {
        let mut inner = Condition::or();
        inner
            .where_("name like ?", args!["a%"])
            .where_("or name like ?", args!["b%"]);

        let mut outer = Condition::new();
        outer.where_("status = ?", args![1]).where_condition(&inner);
        let f = outer.get_fragment();
        assert_eq!(f.sql(), "status = ? or (name like ? or name like ?)");
        assert_eq!(f.args(), &args![1, "a%", "b%"][..]);
    }

    #[test]
    fn nested_default_connective_is_and() {
        let mut inner = Condition::new();
        inner.where_("x = 1", args![]);
        let mut outer = Condition::new();
        outer.where_condition(&inner).where_condition(&inner);
        assert_eq!(outer.get_fragment().sql(), "(x = 1) and (x = 1)");
    }

    #[test]
    fn bare_nested_condition_has_no_prefix() {
        let mut inner = Condition::bare();
        inner.where_("x = 1", args![]);
        let mut outer = Condition::new();
        outer.where_("y = 2", args![]).where_condition(&inner);
        assert_eq!(outer.get_fragment().sql(), "y = 2 and (x = 1)");
    }

    #[test]
    fn empty_nested_condition_is_ignored() {
        let mut outer = Condition::new();
        outer.where_condition(&Condition::or());
        assert!(outer.is_empty());
    }

    #[test]
    fn search_empty_string_boundaries() {
        let mut c = Condition::new();
        c.search("name=?", "", SearchPolicy::WithoutEmpty);
        c.search("name=?", "", SearchPolicy::WithoutZero);
        assert!(c.is_empty());
        c.search("name=?", "", SearchPolicy::WithoutNil);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_fragment().args(), &args![""][..]);
    }

    #[test]
    fn search_zero_values() {
        let mut c = Condition::new();
        c.search("a=?", 0, SearchPolicy::WithoutZero)
            .search("b=?", 0.0, SearchPolicy::WithoutZero)
            .search("c=?", false, SearchPolicy::WithoutZero)
            .search("d=?", 0u32, SearchPolicy::WithoutZero);
        assert!(c.is_empty());

        c.search("a=?", 0, SearchPolicy::WithoutEmpty)
            .search("c=?", false, SearchPolicy::WithoutNil);
        assert_eq!(c.get_fragment().sql(), "a=? and c=?");
    }

    #[test]
    fn search_skips_null_under_every_policy() {
        let mut c = Condition::new();
        for policy in [
            SearchPolicy::WithoutEmpty,
            SearchPolicy::WithoutZero,
            SearchPolicy::WithoutNil,
        ] {
            c.search("a=?", None::<i32>, policy);
            c.search("a in ([?])", Value::list(Vec::<i32>::new()), policy);
        }
        assert!(c.is_empty());
    }

    #[test]
    fn search_expands_list_marker() {
        let mut c = Condition::new();
        c.search("id in ([?])", Value::list([3, 4, 5]), SearchPolicy::WithoutZero);
        let f = c.get_fragment();
        assert_eq!(f.sql(), "id in (?,?,?)");
        assert_eq!(f.args(), &args![3, 4, 5][..]);
    }

    #[test]
    fn search_drops_list_without_single_marker() {
        let mut c = Condition::new();
        c.search("id in (?)", Value::list([1]), SearchPolicy::WithoutEmpty)
            .search("a in ([?]) or b in ([?])", Value::list([1]), SearchPolicy::WithoutEmpty);
        assert!(c.is_empty());
    }

    #[test]
    fn search_ignores_unrecognized_types() {
        let mut c = Condition::new();
        c.search("t=?", chrono::Utc::now(), SearchPolicy::WithoutNil)
            .search("b=?", vec![1u8], SearchPolicy::WithoutNil)
            .search("j=?", serde_json::json!(1), SearchPolicy::WithoutNil);
        assert!(c.is_empty());
    }

    #[test]
    fn clear_keeps_connective() {
        let mut c = Condition::or();
        c.where_("a=1", args![]).clear();
        assert!(c.is_empty());
        assert_eq!(c.connective(), Connective::Or);
    }
}

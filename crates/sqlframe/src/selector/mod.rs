//! SELECT statement builder.
//!
//! A [`Selector`] is bound to one table and one [`Db`] handle. Setters ignore blank
//! input, so optional clauses can be chained without `if` guards:
//!
//! ```ignore
//! use sqlframe::{SearchPolicy, args};
//!
//! let mut s = db.selector("@pf_article");
//! s.field("id, title, created_at", args![])
//!     .where_("status = ?", args![1])
//!     .search("category_id = ?", form.category, SearchPolicy::WithoutZero)
//!     .order("created_at desc", args![])
//!     .set_page(form.page, 20);
//!
//! let rows = s.page_list().await?;
//! let info = s.get_page_info().await?;
//! ```

mod build;
mod page;


pub use page::PageInfo;

use crate::condition::{Condition, SearchPolicy};
use crate::db::Db;
use crate::fragment::{Fragment, FragmentKind};
use crate::value::Value;

/// Page size used when none (or an invalid one) is set.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Row window for the `limit` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `limit n`
    Count(u64),
    /// `limit offset,size`
    Range { offset: u64, size: u64 },
}

impl Limit {
    fn to_sql(self) -> String {
        match self {
            Limit::Count(n) => format!("limit {n}"),
            Limit::Range { offset, size } => format!("limit {offset},{size}"),
        }
    }
}

/// Fluent SELECT builder over a table.
#[derive(Debug)]
pub struct Selector<'a, C> {
    db: &'a Db<C>,
    table: String,
    condition: Condition,
    having: Option<Condition>,
    fields: Option<Fragment>,
    orders: Option<Fragment>,
    groups: Option<Fragment>,
    joins: Option<Fragment>,
    unions: Vec<Fragment>,
    limit: Option<Limit>,
    page: u64,
    page_size: u64,
    count: Option<u64>,
}

impl<'a, C> Selector<'a, C> {
    pub fn new(db: &'a Db<C>, table: &str) -> Self {
        Self {
            db,
            table: table.trim().to_string(),
            condition: Condition::new(),
            having: None,
            fields: None,
            orders: None,
            groups: None,
            joins: None,
            unions: Vec::new(),
            limit: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            count: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The WHERE condition.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn condition_mut(&mut self) -> &mut Condition {
        &mut self.condition
    }

    // ==================== WHERE ====================

    /// See [`Condition::where_`].
    pub fn where_(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        self.condition.where_(sql, args);
        self
    }

    /// See [`Condition::where_condition`].
    pub fn where_condition(&mut self, other: &Condition) -> &mut Self {
        self.condition.where_condition(other);
        self
    }

    /// See [`Condition::search`].
    pub fn search(
        &mut self,
        sql: &str,
        value: impl Into<Value>,
        policy: SearchPolicy,
    ) -> &mut Self {
        self.condition.search(sql, value, policy);
        self
    }

    // ==================== Columns / ordering ====================

    /// Replace the selected columns (default `*`).
    pub fn field(&mut self, fields: &str, args: Vec<Value>) -> &mut Self {
        let fields = fields.trim();
        if fields.is_empty() {
            return self;
        }
        self.fields = Some(Fragment::new(fields, FragmentKind::Field, args));
        self
    }

    /// Add an `order by` term. A leading `by ` or `,` is ignored.
    pub fn order(&mut self, order: &str, args: Vec<Value>) -> &mut Self {
        append_list(&mut self.orders, "order by", FragmentKind::Order, order, args);
        self
    }

    /// Add a `group by` term. A leading `by ` or `,` is ignored.
    pub fn group(&mut self, group: &str, args: Vec<Value>) -> &mut Self {
        append_list(&mut self.groups, "group by", FragmentKind::Group, group, args);
        self
    }

    /// Add a HAVING clause.
    pub fn having(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        if sql.trim().is_empty() {
            return self;
        }
        self.having
            .get_or_insert_with(Condition::new)
            .where_(sql, args);
        self
    }

    /// Set the row window. `(0, 0)` clears it and `size == 0` emits `limit offset`.
    pub fn limit(&mut self, offset: u64, size: u64) -> &mut Self {
        self.limit = match (offset, size) {
            (0, 0) => None,
            (n, 0) => Some(Limit::Count(n)),
            (offset, size) => Some(Limit::Range { offset, size }),
        };
        self
    }

    // ==================== JOIN ====================

    pub fn left_join(&mut self, table: &str, args: Vec<Value>) -> &mut Self {
        self.join("left join", table, args)
    }

    pub fn right_join(&mut self, table: &str, args: Vec<Value>) -> &mut Self {
        self.join("right join", table, args)
    }

    pub fn inner_join(&mut self, table: &str, args: Vec<Value>) -> &mut Self {
        self.join("inner join", table, args)
    }

    pub fn outer_join(&mut self, table: &str, args: Vec<Value>) -> &mut Self {
        self.join("outer join", table, args)
    }

    pub fn full_join(&mut self, table: &str, args: Vec<Value>) -> &mut Self {
        self.join("full join", table, args)
    }

    /// Add an `on` clause to the joins. Ignored until a join exists.
    pub fn join_on(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        let sql = sql.trim();
        if sql.is_empty() {
            return self;
        }
        if let Some(joins) = self.joins.as_mut() {
            joins.append(&format!("on {sql}"), args);
        }
        self
    }

    fn join(&mut self, keyword: &str, table: &str, args: Vec<Value>) -> &mut Self {
        let table = table.trim();
        if table.is_empty() {
            return self;
        }
        let sql = format!("{keyword} {table}");
        match self.joins.as_mut() {
            Some(joins) => {
                joins.append(&sql, args);
            }
            None => self.joins = Some(Fragment::new(sql, FragmentKind::Join, args)),
        }
        self
    }

    // ==================== UNION ====================

    pub fn union(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        self.push_union(sql, FragmentKind::Union, args)
    }

    pub fn union_all(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        self.push_union(sql, FragmentKind::UnionAll, args)
    }

    fn push_union(&mut self, sql: &str, kind: FragmentKind, args: Vec<Value>) -> &mut Self {
        let sql = sql.trim();
        if !sql.is_empty() {
            self.unions.push(Fragment::new(sql, kind, args));
        }
        self
    }
}

/// Strip a leading `by ` or `,`, then start or extend an `order by`/`group by` list.
fn append_list(
    slot: &mut Option<Fragment>,
    head: &str,
    kind: FragmentKind,
    term: &str,
    args: Vec<Value>,
) {
    let term = strip_list_prefix(term.trim()).trim();
    if term.is_empty() {
        return;
    }
    match slot {
        Some(list) => {
            list.append(&format!(",{term}"), args);
        }
        None => *slot = Some(Fragment::new(format!("{head} {term}"), kind, args)),
    }
}

fn strip_list_prefix(term: &str) -> &str {
    if let Some(rest) = term.strip_prefix(',') {
        return rest;
    }
    match term.get(..2) {
        Some(head) if head.eq_ignore_ascii_case("by") => {
            let rest = &term[2..];
            if rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                term
            }
        }
        _ => term,
    }
}

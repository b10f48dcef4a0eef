//! Statement rendering for [`Selector`].

use super::{Limit, Selector};
use crate::condition::strip_leading_connective;
use crate::fragment::{Fragment, FragmentKind};
use crate::statement::quote_ident;
use crate::value::Value;

/// Knobs that distinguish the data, count, page and row variants.
#[derive(Clone, Copy)]
struct Render<'r> {
    optimize: bool,
    orders: Option<&'r Fragment>,
    limit: Option<Limit>,
}

struct Parts {
    sql: Vec<String>,
    args: Vec<Value>,
}

impl Parts {
    fn new() -> Self {
        Self {
            sql: Vec::new(),
            args: Vec::new(),
        }
    }

    fn push(&mut self, sql: impl Into<String>) {
        self.sql.push(sql.into());
    }

    fn push_fragment(&mut self, fragment: &Fragment) {
        if fragment.is_empty() {
            return;
        }
        self.sql.push(fragment.sql().to_string());
        self.args.extend_from_slice(fragment.args());
    }

    fn finish(self) -> Fragment {
        Fragment::new(self.sql.join(" "), FragmentKind::Sql, self.args)
    }
}

impl<C> Selector<'_, C> {
    /// A table containing whitespace is a raw FROM expression, not an identifier.
    fn is_raw_table(&self) -> bool {
        self.table.contains(char::is_whitespace)
    }

    fn from_target(&self) -> String {
        if self.is_raw_table() {
            self.table.clone()
        } else {
            quote_ident(&self.table)
        }
    }

    /// Whether the id-subquery rewrite applies to this statement.
    ///
    /// Only a plain single-table select with a limit qualifies: no raw FROM
    /// expression, joins, grouping, having or unions.
    pub fn can_optimize(&self) -> bool {
        self.optimizable(self.limit)
    }

    fn optimizable(&self, limit: Option<Limit>) -> bool {
        !self.is_raw_table()
            && self.joins.is_none()
            && self.groups.is_none()
            && self.having.is_none()
            && self.unions.is_empty()
            && limit.is_some()
    }

    /// Build the data statement.
    ///
    /// With `optimize` and a statement that allows it, paging runs over an id-only
    /// subquery first:
    ///
    /// ```text
    /// select * from `t` where id in (select id from (select id from `t`
    ///     where … order by … limit o,s ) Z) order by …
    /// ```
    pub fn build_sql(&self, optimize: bool) -> Fragment {
        self.render(Render {
            optimize,
            orders: self.orders.as_ref(),
            limit: self.limit,
        })
    }

    /// Build the `count(1) as mCount` statement.
    ///
    /// Grouped, having or union statements are counted by wrapping the full statement
    /// (without order and limit) in `CountTempTable`.
    pub fn build_count(&self) -> Fragment {
        if self.groups.is_some() || self.having.is_some() || !self.unions.is_empty() {
            let inner = self.render(Render {
                optimize: false,
                orders: None,
                limit: None,
            });
            let (sql, args) = inner.into_parts();
            return Fragment::new(
                format!("select count(1) as mCount from ({sql}) CountTempTable"),
                FragmentKind::Sql,
                args,
            );
        }

        let mut parts = Parts::new();
        parts.push(format!("select count(1) as mCount from {}", self.from_target()));
        if let Some(joins) = &self.joins {
            parts.push_fragment(joins);
        }
        self.push_where(&mut parts);
        parts.finish()
    }

    /// The data statement for the current page: `limit (page-1)*size,size`.
    pub fn build_page(&self) -> Fragment {
        self.render(Render {
            optimize: true,
            orders: self.orders.as_ref(),
            limit: Some(Limit::Range {
                offset: self.page.saturating_sub(1).saturating_mul(self.page_size),
                size: self.page_size,
            }),
        })
    }

    /// The data statement limited to one row, never rewritten.
    pub fn build_row(&self) -> Fragment {
        self.render(Render {
            optimize: false,
            orders: self.orders.as_ref(),
            limit: Some(Limit::Count(1)),
        })
    }

    fn push_where(&self, parts: &mut Parts) {
        let frame = self.condition.get_fragment();
        if frame.is_empty() {
            return;
        }
        let sql = strip_leading_connective(frame.sql()).unwrap_or(frame.sql());
        parts.push(format!("where {sql}"));
        parts.args.extend_from_slice(frame.args());
    }

    fn render(&self, opts: Render<'_>) -> Fragment {
        let optimize = opts.optimize && self.optimizable(opts.limit);

        let mut parts = Parts::new();
        let from = self.from_target();
        match &self.fields {
            Some(fields) => {
                parts.push(format!("select {} from {from}", fields.sql()));
                parts.args.extend_from_slice(fields.args());
            }
            None => parts.push(format!("select * from {from}")),
        }
        if let Some(joins) = &self.joins {
            parts.push_fragment(joins);
        }
        if optimize {
            parts.push(format!("where id in (select id from (select id from {from}"));
        }
        self.push_where(&mut parts);
        if let Some(groups) = &self.groups {
            parts.push_fragment(groups);
        }
        if let Some(having) = &self.having {
            let frame = having.get_fragment();
            if !frame.is_empty() {
                let sql = strip_leading_connective(frame.sql()).unwrap_or(frame.sql());
                parts.push(format!("having {sql}"));
                parts.args.extend_from_slice(frame.args());
            }
        }
        if !self.unions.is_empty() {
            parts.sql.insert(0, "(".to_string());
            parts.push(")");
            for union in &self.unions {
                let keyword = match union.kind() {
                    FragmentKind::UnionAll => "union all",
                    _ => "union",
                };
                parts.push(format!("{keyword} ( {} )", union.sql()));
                parts.args.extend_from_slice(union.args());
            }
        }
        if let Some(orders) = opts.orders {
            parts.push_fragment(orders);
        }
        if let Some(limit) = opts.limit {
            parts.push(limit.to_sql());
        }
        if optimize {
            parts.push(") Z)");
            if let Some(orders) = opts.orders {
                parts.push_fragment(orders);
            }
        }
        parts.finish()
    }
}

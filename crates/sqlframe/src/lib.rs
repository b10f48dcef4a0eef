//! # sqlframe
//!
//! A composable SQL statement builder and executor for MySQL.
//!
//! ## Features
//!
//! - **Literal escaping**: `?` placeholders rendered as MySQL literals for logs and inline SQL
//! - **Fragments and conditions**: compose predicates with search policies that drop empty filters
//! - **Selector**: SELECT builder with joins, unions, grouping, paging and count queries
//! - **Executor**: insert / replace / update / delete over an ordered column map
//! - **Table prefix**: every `@pf_` in a statement becomes the configured prefix
//! - **Transactions**: the same [`Db`] API runs inside [`Db::transaction`] or [`transaction!`]
//!
//! ```ignore
//! use sqlframe::prelude::*;
//!
//! let db = sqlframe::mysql::connect(&DbConfig::from_env()?).await?;
//!
//! let mut posts = db.selector("@pf_post");
//! posts
//!     .where_("status = ?", args![1])
//!     .search("category_id = ?", category_id, SearchPolicy::WithoutZero)
//!     .order("id desc", args![])
//!     .set_page(page, 20);
//! let rows = posts.page_list().await?;
//! let info = posts.get_page_info().await?;
//!
//! let mut data = Data::new();
//! data.set("title", "hello").set("status", 1);
//! let id = db.insert_and_get_last_id("@pf_post", &data).await?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod db;
pub mod error;
pub mod escape;
pub mod fragment;
pub mod log;
pub mod record;
pub mod selector;
pub mod statement;
pub mod transaction;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;

pub mod prelude;

pub use client::{Driver, ExecResult, GenericClient, TxClient};
pub use condition::{Condition, Connective, SearchPolicy};
pub use config::DbConfig;
pub use db::{Db, PREFIX_TOKEN, Settings, Tx};
pub use error::{DbError, DbResult};
pub use escape::{escape, escape_with};
pub use fragment::{Fragment, FragmentKind};
pub use log::StatementKind;
pub use record::{ColumnKind, Field, RawRow, Record, RowSource, materialize};
pub use selector::{Limit, PageInfo, Selector};
pub use statement::{Column, Data, Where};
pub use value::{Value, zero_time};

#[cfg(feature = "mysql")]
pub use mysql::{MySqlClient, MySqlTx};

//! Statement executor.
//!
//! [`Db`] wraps any [`GenericClient`] with the settings the builders need: the table
//! prefix, the timezone for inlined timestamps and an optional per-statement timeout.
//! A transaction is the same type over the driver's transaction client, so code
//! written against `Db<C>` runs unchanged inside [`Db::transaction`].

use crate::client::{Driver, ExecResult, GenericClient, TxClient};
use crate::error::{DbError, DbResult};
use crate::escape::{bound_placeholder_count, default_timezone};
use crate::fragment::Fragment;
use crate::record::{Record, materialize};
use crate::selector::Selector;
use crate::statement::{Data, InsertVerb, Where, build_delete, build_insert, build_update};
use crate::value::Value;
use chrono::FixedOffset;
use futures_core::future::BoxFuture;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Token replaced by [`Settings::prefix`] in every executed statement.
pub const PREFIX_TOKEN: &str = "@pf_";

/// Executor settings shared by a [`Db`] and the transactions it opens.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Table-name prefix substituted for `@pf_`.
    pub prefix: String,
    /// Zone used when timestamps are inlined as literals.
    pub timezone: FixedOffset,
    /// Upper bound for a single statement; `None` waits indefinitely.
    pub query_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            timezone: default_timezone(),
            query_timeout: None,
        }
    }
}

impl Settings {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

/// A connection handle: a pool, a connection or an open transaction.
#[derive(Debug, Clone)]
pub struct Db<C> {
    client: C,
    settings: Arc<Settings>,
}

/// The transaction handle type for a driver.
pub type Tx<D> = Db<<D as Driver>::Tx>;

impl<C> Db<C> {
    pub fn new(client: C) -> Self {
        Self::with_settings(client, Settings::default())
    }

    pub fn with_settings(client: C, settings: Settings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace every `@pf_` token with the configured prefix.
    pub fn apply_prefix<'s>(&self, sql: &'s str) -> Cow<'s, str> {
        if sql.contains(PREFIX_TOKEN) {
            Cow::Owned(sql.replace(PREFIX_TOKEN, &self.settings.prefix))
        } else {
            Cow::Borrowed(sql)
        }
    }

    async fn with_timeout<T, F>(&self, future: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        match self.settings.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| DbError::Timeout(timeout))?,
            None => future.await,
        }
    }
}

/// Prefix substitution, placeholder check and logging shared by every statement.
fn prepare<'s, C>(db: &Db<C>, sql: &'s str, args: &[Value]) -> DbResult<Cow<'s, str>> {
    let sql = db.apply_prefix(sql);
    let placeholders = bound_placeholder_count(&sql);
    if placeholders != args.len() {
        return Err(DbError::ArgumentCountMismatch {
            placeholders,
            args: args.len(),
        });
    }
    crate::log::statement(&sql, args.len());
    Ok(sql)
}

impl<C: GenericClient> Db<C> {
    /// Execute a statement that returns no rows.
    pub async fn exec(&self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
        let sql = prepare(self, sql, args)?;
        self.with_timeout(self.client.execute(&sql, args)).await
    }

    /// Run a query and materialize every row.
    pub async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<Record>> {
        let sql = prepare(self, sql, args)?;
        let rows = self.with_timeout(self.client.query(&sql, args)).await?;
        Ok(rows.iter().map(materialize).collect())
    }

    /// Run a query and return its first row, if any.
    pub async fn query_row(&self, sql: &str, args: &[Value]) -> DbResult<Option<Record>> {
        Ok(self.query(sql, args).await?.into_iter().next())
    }

    /// Run a built statement (e.g. [`Selector::build_sql`]) as a query.
    pub async fn query_fragment(&self, fragment: &Fragment) -> DbResult<Vec<Record>> {
        self.query(fragment.sql(), fragment.args()).await
    }

    /// Run a built statement as a write.
    pub async fn exec_fragment(&self, fragment: &Fragment) -> DbResult<ExecResult> {
        self.exec(fragment.sql(), fragment.args()).await
    }

    pub async fn insert(&self, table: &str, data: &Data) -> DbResult<ExecResult> {
        let stmt = build_insert(InsertVerb::Insert, table, data, &self.settings.timezone)?;
        self.exec_fragment(&stmt).await
    }

    /// Insert a row and return the id the server generated for it.
    pub async fn insert_and_get_last_id(&self, table: &str, data: &Data) -> DbResult<u64> {
        Ok(self.insert(table, data).await?.last_insert_id)
    }

    pub async fn replace(&self, table: &str, data: &Data) -> DbResult<ExecResult> {
        let stmt = build_insert(InsertVerb::Replace, table, data, &self.settings.timezone)?;
        self.exec_fragment(&stmt).await
    }

    /// Update rows matching `where_`: a numeric id (`id=?`) or a predicate whose
    /// placeholders are filled from `args`.
    pub async fn update(
        &self,
        table: &str,
        data: &Data,
        where_: impl Into<Where>,
        args: &[Value],
    ) -> DbResult<ExecResult> {
        let stmt = build_update(table, data, &where_.into(), args, &self.settings.timezone)?;
        self.exec_fragment(&stmt).await
    }

    pub async fn delete(
        &self,
        table: &str,
        where_: impl Into<Where>,
        args: &[Value],
    ) -> DbResult<ExecResult> {
        let stmt = build_delete(table, &where_.into(), args)?;
        self.exec_fragment(&stmt).await
    }

    /// Start a SELECT on `table`.
    pub fn selector(&self, table: &str) -> Selector<'_, C> {
        Selector::new(self, table)
    }
}

impl<D: Driver> Db<D> {
    /// Open a transaction sharing this handle's settings.
    pub async fn begin(&self) -> DbResult<Tx<D>> {
        let tx = self.client.begin().await?;
        Ok(Db {
            client: tx,
            settings: Arc::clone(&self.settings),
        })
    }

    /// Run `work` in a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// ```ignore
    /// let id = db
    ///     .transaction(|tx| Box::pin(async move {
    ///         let id = tx.insert_and_get_last_id("order", &order).await?;
    ///         tx.update("stock", &stock, item_id, &[]).await?;
    ///         Ok(id)
    ///     }))
    ///     .await?;
    /// ```
    pub async fn transaction<F, R>(&self, work: F) -> DbResult<R>
    where
        F: for<'t> FnOnce(&'t Tx<D>) -> BoxFuture<'t, DbResult<R>>,
    {
        let tx = self.begin().await?;
        let result = work(&tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => match tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }
}

impl<T: TxClient> Db<T> {
    pub async fn commit(self) -> DbResult<()> {
        self.client.commit().await
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.client.rollback().await
    }
}

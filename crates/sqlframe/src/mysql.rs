//! MySQL driver adapter on top of `sqlx`.
//!
//! ```ignore
//! use sqlframe::{DbConfig, mysql};
//!
//! let db = mysql::connect(&DbConfig::from_env()?).await?;
//! let rows = db.selector("@pf_user").where_("status = ?", args![1]).get_list().await?;
//! ```

use crate::client::{Driver, ExecResult, GenericClient, TxClient};
use crate::config::DbConfig;
use crate::db::Db;
use crate::error::{DbError, DbResult};
use crate::record::RowSource;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::mysql::{
    MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow,
};
use sqlx::query::Query;
use sqlx::{Column, Row, Transaction, TypeInfo};
use tokio::sync::Mutex;

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// Connect options for the configured server.
pub fn connect_options(config: &DbConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .charset(&config.charset)
}

fn pool_options(config: &DbConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.pool_size.max(1))
        .max_lifetime(config.max_lifetime())
}

/// Create a pool that connects on first use.
pub fn create_pool(config: &DbConfig) -> MySqlPool {
    pool_options(config).connect_lazy_with(connect_options(config))
}

/// Open a pool, verify that the server is reachable and wrap it in a [`Db`].
pub async fn connect(config: &DbConfig) -> DbResult<Db<MySqlClient>> {
    let settings = config.settings()?;
    let pool = pool_options(config)
        .connect_with(connect_options(config))
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;
    Ok(Db::with_settings(MySqlClient::new(pool), settings))
}

/// Wrap a lazily connecting pool in a [`Db`].
pub fn connect_lazy(config: &DbConfig) -> DbResult<Db<MySqlClient>> {
    let settings = config.settings()?;
    Ok(Db::with_settings(
        MySqlClient::new(create_pool(config)),
        settings,
    ))
}

fn bind_value<'q>(query: MySqlQuery<'q>, value: &'q Value) -> DbResult<MySqlQuery<'q>> {
    Ok(match value {
        Value::Null => query.bind(None::<i32>),
        Value::Int(v) => query.bind(*v),
        Value::UInt(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Bool(v) => query.bind(*v),
        Value::Str(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
        Value::Timestamp(t) => query.bind(*t),
        Value::Raw(b) => match std::str::from_utf8(b) {
            Ok(s) => query.bind(s),
            Err(_) => query.bind(b.as_slice()),
        },
        Value::List(_) => {
            return Err(DbError::UnsupportedValueType(format!(
                "{} values cannot be bound as a parameter",
                value.type_name()
            )));
        }
    })
}

fn build_query<'q>(sql: &'q str, args: &'q [Value]) -> DbResult<MySqlQuery<'q>> {
    args.iter()
        .try_fold(sqlx::query(sql), |query, arg| bind_value(query, arg))
}

/// Pool-backed client.
#[derive(Debug, Clone)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl GenericClient for MySqlClient {
    type Row = MySqlRow;

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
        let result = build_query(sql, args)?.execute(&self.pool).await?;
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<MySqlRow>> {
        Ok(build_query(sql, args)?.fetch_all(&self.pool).await?)
    }
}

impl Driver for MySqlClient {
    type Tx = MySqlTx;

    async fn begin(&self) -> DbResult<MySqlTx> {
        let tx = self.pool.begin().await?;
        Ok(MySqlTx {
            inner: Mutex::new(Some(tx)),
        })
    }
}

/// An open transaction. Statements run one at a time on its connection.
pub struct MySqlTx {
    inner: Mutex<Option<Transaction<'static, MySql>>>,
}

impl std::fmt::Debug for MySqlTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlTx").finish_non_exhaustive()
    }
}

fn finished() -> DbError {
    DbError::Transaction("transaction already finished".to_string())
}

impl GenericClient for MySqlTx {
    type Row = MySqlRow;

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        let result = build_query(sql, args)?.execute(&mut **tx).await?;
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<MySqlRow>> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        Ok(build_query(sql, args)?.fetch_all(&mut **tx).await?)
    }
}

impl TxClient for MySqlTx {
    async fn commit(self) -> DbResult<()> {
        let tx = self.inner.into_inner().ok_or_else(finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        let tx = self.inner.into_inner().ok_or_else(finished)?;
        tx.rollback().await?;
        Ok(())
    }
}

fn cell<'r, T>(row: &'r MySqlRow, idx: usize) -> Option<T>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

impl RowSource for MySqlRow {
    fn column_count(&self) -> usize {
        self.columns().len()
    }

    fn column_name(&self, idx: usize) -> &str {
        self.columns().get(idx).map_or("", |c| c.name())
    }

    fn column_type(&self, idx: usize) -> &str {
        self.columns()
            .get(idx)
            .map_or("", |c| c.type_info().name())
    }

    fn get_int(&self, idx: usize) -> Option<i64> {
        cell::<i64>(self, idx)
            .or_else(|| cell::<u64>(self, idx).map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            .or_else(|| cell::<bool>(self, idx).map(i64::from))
    }

    fn get_float(&self, idx: usize) -> Option<f64> {
        cell::<f64>(self, idx)
            .or_else(|| cell::<f32>(self, idx).map(f64::from))
            .or_else(|| cell::<Decimal>(self, idx).and_then(|d| d.to_f64()))
    }

    fn get_time(&self, idx: usize) -> Option<DateTime<Utc>> {
        cell::<DateTime<Utc>>(self, idx)
            .or_else(|| cell::<NaiveDateTime>(self, idx).map(|t| t.and_utc()))
            .or_else(|| {
                cell::<NaiveDate>(self, idx)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|t| t.and_utc())
            })
    }

    fn get_bytes(&self, idx: usize) -> Option<Vec<u8>> {
        cell::<Vec<u8>>(self, idx)
    }

    fn get_string(&self, idx: usize) -> Option<String> {
        cell::<String>(self, idx)
            .or_else(|| cell::<NaiveTime>(self, idx).map(|t| t.to_string()))
            .or_else(|| cell::<Vec<u8>>(self, idx).map(|b| String::from_utf8_lossy(&b).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn scalar_args_bind() {
        let args = args![None::<i32>, 1, 2u64, 1.5, true, "x", vec![0u8, 1]];
        assert!(build_query("select ?,?,?,?,?,?,?", &args).is_ok());
    }

    #[test]
    fn list_args_are_rejected() {
        let args = [Value::list([1, 2])];
        assert!(matches!(
            build_query("select ?", &args),
            Err(DbError::UnsupportedValueType(ref m)) if m.starts_with("list values")
        ));
    }

    #[test]
    fn invalid_timezone_fails_before_connecting() {
        let config = DbConfig {
            timezone_offset_secs: 90_000,
            ..DbConfig::default()
        };
        assert!(matches!(connect_lazy(&config), Err(DbError::Config(_))));
    }

    #[tokio::test]
    async fn lazy_pool_carries_settings() {
        let config = DbConfig {
            prefix: "app_".to_string(),
            ..DbConfig::default()
        };
        let db = connect_lazy(&config).unwrap();
        assert_eq!(db.settings().prefix, "app_");
        assert_eq!(db.settings().timezone.local_minus_utc(), 8 * 3600);
    }
}

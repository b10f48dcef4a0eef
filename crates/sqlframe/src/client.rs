//! Connection capability traits.
//!
//! The builders and the [`Db`](crate::Db) executor never talk to a driver directly.
//! They only need something that can run a statement with positional `?` arguments
//! and hand back rows; a pool and a transaction both qualify, which is what lets
//! [`Db`](crate::Db) and [`Tx`](crate::Tx) share one API.

use crate::error::DbResult;
use crate::record::RowSource;
use crate::value::Value;
use std::future::Future;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// `LAST_INSERT_ID()` reported for the statement, `0` when none was generated.
    pub last_insert_id: u64,
}

/// Something that can execute SQL: a pool, a connection or a transaction.
///
/// `sql` always uses `?` placeholders, and `args.len()` has already been checked
/// against them by the caller.
pub trait GenericClient: Send + Sync {
    /// Row type produced by [`GenericClient::query`].
    type Row: RowSource + Send;

    /// Execute a statement and report affected rows / last insert id.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = DbResult<ExecResult>> + Send;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = DbResult<Vec<Self::Row>>> + Send;
}

/// A client that can open transactions.
pub trait Driver: GenericClient {
    type Tx: TxClient;

    fn begin(&self) -> impl Future<Output = DbResult<Self::Tx>> + Send;
}

/// An open transaction.
///
/// Dropping a transaction without calling either method leaves the outcome to the
/// driver (sqlx rolls back).
pub trait TxClient: GenericClient + Sized {
    fn commit(self) -> impl Future<Output = DbResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = DbResult<()>> + Send;
}

//! Transaction macro.
//!
//! [`Db::transaction`](crate::Db::transaction) takes a boxed closure. When the unit
//! of work is easier to write inline, use [`transaction!`] around a block instead:
//!
//! ```ignore
//! use sqlframe::{DbResult, Data, args};
//!
//! # async fn demo(db: &sqlframe::Db<sqlframe::mysql::MySqlClient>) -> DbResult<()> {
//! sqlframe::transaction!(db, tx, {
//!     tx.exec("update account set balance = balance - ? where id = ?", &args![100, 1])
//!         .await?;
//!     tx.exec("update account set balance = balance + ? where id = ?", &args![100, 2])
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$db.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`; a failed rollback is reported inside the returned error.
///
/// The block must evaluate to `sqlframe::DbResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let $tx = ($db).begin().await?;

        let __sqlframe_tx_body_result: $crate::DbResult<_> = async { $body }.await;
        match __sqlframe_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::DbError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

//! Transaction helper macro.
//!
//! Transactions are ordinary [`crate::Db`] sessions returned by
//! [`crate::Db::begin`]; pass them anywhere a `Db` is expected. For
//! ergonomic commit/rollback handling, use the [`transaction!`] macro.
//!
//! # Example
//!
//! ```ignore
//! use sqlkit::{mapping, OrmResult};
//!
//! # async fn demo(db: &sqlkit::Db<sqlkit::postgres::PgDriver>) -> OrmResult<()> {
//! let moved = sqlkit::transaction!(db, tx, {
//!     tx.update("accounts", "balance = balance - 100", mapping! { "id" => 1 }, &[])
//!         .await?;
//!     tx.update("accounts", "balance = balance + 100", mapping! { "id" => 2 }, &[])
//!         .await?;
//!     Ok(2)
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$db.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `sqlkit::OrmResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let $tx = ($db).begin().await?;

        let __sqlkit_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        match __sqlkit_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

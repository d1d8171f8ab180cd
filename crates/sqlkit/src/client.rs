//! Driver traits consumed by the execution wrapper.
//!
//! Any database driver can sit behind [`crate::Db`] by implementing
//! [`Executor`]; pools additionally implement [`Connector`] to hand out
//! transactions, which implement [`TxHandle`]. The bundled implementation is
//! [`crate::postgres::PgDriver`].

use crate::builder::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::mapping::Row;
use crate::value::Value;
use std::future::Future;

/// Outcome of a data-modifying statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Id generated by the last insert, `0` when the driver has none.
    pub last_insert_id: u64,
    pub rows_affected: u64,
}

/// Executes finished statements.
///
/// SQL handed to an executor uses `?` placeholders; drivers for other
/// placeholder styles rewrite them.
pub trait Executor: Send + Sync {
    /// SQL flavour this driver speaks.
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    /// Execute a statement and report the insert id and affected row count.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Execute a query and return all rows in order.
    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Returns [`OrmError::NotFound`] if no rows are returned.
    fn query_one(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Row>> + Send {
        async move {
            self.query(sql, args)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("no rows in result set"))
        }
    }
}

/// A driver transaction.
///
/// `commit` and `rollback` consume the handle, so it cannot be used afterwards.
pub trait TxHandle: Executor + Sized {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send;
}

/// A driver that can open transactions.
pub trait Connector: Executor {
    type Tx: TxHandle;

    fn begin(&self) -> impl Future<Output = OrmResult<Self::Tx>> + Send;
}

impl<E: Executor> Executor for &E {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send {
        (**self).execute(sql, args)
    }

    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, args)
    }

    fn query_one(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Row>> + Send {
        (**self).query_one(sql, args)
    }
}

impl<E: Executor> Executor for std::sync::Arc<E> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send {
        (**self).execute(sql, args)
    }

    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, args)
    }

    fn query_one(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Row>> + Send {
        (**self).query_one(sql, args)
    }
}

impl<C: Connector> Connector for std::sync::Arc<C> {
    type Tx = C::Tx;

    fn begin(&self) -> impl Future<Output = OrmResult<Self::Tx>> + Send {
        (**self).begin()
    }
}

//! Pooled Postgres driver.

use super::config::Configuration;
use crate::builder::Dialect;
use crate::client::{Connector, ExecResult, Executor, TxHandle};
use crate::error::{OrmError, OrmResult};
use crate::mapping::{Mapping, Row};
use crate::placeholder::number_placeholders;
use crate::value::Value;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tokio_postgres::types::ToSql;

/// A connection pool speaking the Postgres dialect.
///
/// Cloning is cheap; clones share the pool.
///
/// # Example
///
/// ```ignore
/// let driver = PgDriver::connect(&Configuration::from_map(json!({
///     "host": "localhost",
///     "username": "app",
///     "database": "shop",
/// }))?)
/// .await?;
/// let db = sqlkit::Db::new(driver);
/// ```
#[derive(Clone)]
pub struct PgDriver {
    pool: Pool,
}

impl std::fmt::Debug for PgDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDriver")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl PgDriver {
    /// Build the pool and verify that a connection can be opened.
    pub async fn connect(cfg: &Configuration) -> OrmResult<Self> {
        cfg.validate()?;
        tracing::info!(target: "sqlkit.pool", addr = %cfg.display_target(), "connecting");

        let mgr = Manager::from_config(
            cfg.pg_config(),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(mgr)
            .max_size(cfg.max_open_conns)
            .runtime(Runtime::Tokio1)
            .create_timeout(Some(cfg.connect_timeout()))
            .build()
            .map_err(|e| OrmError::Pool(e.to_string()))?;

        let conn = pool.get().await?;
        conn.batch_execute("select 1")
            .await
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        drop(conn);

        tracing::info!(target: "sqlkit.pool", addr = %cfg.display_target(), "connect succeed");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Close the pool. Checked-out connections are dropped when returned.
    pub fn close(&self) {
        self.pool.close();
    }
}

impl Executor for PgDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let conn = self.pool.get().await?;
        execute_on(&conn, sql, args).await
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let conn = self.pool.get().await?;
        query_on(&conn, sql, args).await
    }
}

impl Connector for PgDriver {
    type Tx = PgTx;

    async fn begin(&self) -> OrmResult<PgTx> {
        let conn = self.pool.get().await?;
        conn.batch_execute("begin").await?;
        Ok(PgTx { conn: Some(conn) })
    }
}

/// A transaction pinned to one pooled connection.
///
/// Dropping an unfinished transaction detaches its connection from the pool;
/// closing the connection makes the server roll the transaction back.
pub struct PgTx {
    conn: Option<Object>,
}

impl std::fmt::Debug for PgTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTx")
            .field("open", &self.conn.is_some())
            .finish()
    }
}

impl PgTx {
    fn conn(&self) -> OrmResult<&Object> {
        self.conn
            .as_ref()
            .ok_or_else(|| OrmError::Other("transaction already finished".to_string()))
    }

    async fn finish(mut self, statement: &str) -> OrmResult<()> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| OrmError::Other("transaction already finished".to_string()))?;
        if let Err(e) = conn.batch_execute(statement).await {
            // The session state is unknown; never hand it back to the pool.
            let _ = Object::take(conn);
            return Err(e.into());
        }
        Ok(())
    }
}

impl Executor for PgTx {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        execute_on(self.conn()?, sql, args).await
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        query_on(self.conn()?, sql, args).await
    }
}

impl TxHandle for PgTx {
    async fn commit(self) -> OrmResult<()> {
        self.finish("commit").await
    }

    async fn rollback(self) -> OrmResult<()> {
        self.finish("rollback").await
    }
}

impl Drop for PgTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!(
                target: "sqlkit.sql",
                "transaction dropped without commit or rollback; detaching connection"
            );
            let _ = Object::take(conn);
        }
    }
}

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

async fn execute_on(
    client: &tokio_postgres::Client,
    sql: &str,
    args: &[Value],
) -> OrmResult<ExecResult> {
    let sql = number_placeholders(sql);
    let rows_affected = client.execute(&*sql, &params(args)).await?;
    Ok(ExecResult {
        last_insert_id: 0,
        rows_affected,
    })
}

async fn query_on(client: &tokio_postgres::Client, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
    let sql = number_placeholders(sql);
    let rows = client.query(&*sql, &params(args)).await?;
    rows.iter().map(decode_row).collect()
}

fn decode_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Mapping::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value: Value = row
            .try_get(idx)
            .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
        out.insert(column.name(), value);
    }
    Ok(out)
}

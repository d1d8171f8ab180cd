//! Execution wrapper: builds statements, expands list arguments, logs, and
//! runs them through a driver.

use crate::builder::{
    Builder, InsertInput, InsertMode, SelectParams, Statement, UpdateInput, WhereInput,
};
use crate::client::{Connector, ExecResult, Executor, TxHandle};
use crate::config::DbConfig;
use crate::error::{OrmError, OrmResult};
use crate::mapping::{Mapping, Row};
use crate::placeholder::expand_list_args;
use crate::row::{FromRow, RowExt};
use crate::value::{FromValue, ToValue, Value};
use std::sync::Arc;

/// A database session over an [`Executor`]: a pool, a connection, or a
/// transaction.
///
/// Methods take `&self`. A `Db` over a transaction must still be used by one
/// task at a time.
///
/// ```ignore
/// let db = Db::new(PgDriver::connect(&cfg).await?);
/// let users: Vec<User> = db
///     .select("users", "*", mapping! { "status" => 1 }, &[])
///     .await?;
///
/// let tx = db.begin().await?;
/// tx.update("users", mapping! { "status" => 2 }, mapping! { "id" => 7 }, &[])
///     .await?;
/// tx.commit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Db<E> {
    exec: E,
    config: Arc<DbConfig>,
    tx_id: Option<String>,
}

impl<E: Executor> Db<E> {
    pub fn new(exec: E) -> Self {
        Self::with_config(exec, DbConfig::default())
    }

    pub fn with_config(exec: E, config: DbConfig) -> Self {
        Self {
            exec,
            config: Arc::new(config),
            tx_id: None,
        }
    }

    pub fn executor(&self) -> &E {
        &self.exec
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Transaction identifier used in log events; `None` outside a transaction.
    pub fn tx_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    /// Statement builder for this driver's dialect.
    pub fn builder(&self) -> Builder {
        Builder::new(self.exec.dialect())
    }

    // ==================== Driver calls ====================

    fn prepare<'s>(
        &self,
        sql: &'s str,
        args: Vec<Value>,
    ) -> OrmResult<(std::borrow::Cow<'s, str>, Vec<Value>)> {
        let (sql, args) = expand_list_args(sql, args, self.exec.dialect())?;
        self.config.log_sql(self.tx_id(), &sql, &args);
        Ok((sql, args))
    }

    fn log_failure(&self, err: &OrmError) {
        tracing::warn!(
            target: "sqlkit.sql",
            tx = self.tx_id().unwrap_or("-"),
            error = %err,
            "statement failed"
        );
    }

    async fn run_exec(&self, stmt: Statement) -> OrmResult<ExecResult> {
        let (sql, args) = stmt.into_parts();
        let (sql, args) = self.prepare(&sql, args)?;
        self.exec
            .execute(&sql, &args)
            .await
            .inspect_err(|e| self.log_failure(e))
    }

    async fn run_query(&self, stmt: Statement) -> OrmResult<Vec<Row>> {
        let (sql, args) = stmt.into_parts();
        let (sql, args) = self.prepare(&sql, args)?;
        self.exec
            .query(&sql, &args)
            .await
            .inspect_err(|e| self.log_failure(e))
    }

    /// `Ok(None)` when the driver reports no matching row.
    async fn run_query_one(&self, stmt: Statement) -> OrmResult<Option<Row>> {
        let (sql, args) = stmt.into_parts();
        let (sql, args) = self.prepare(&sql, args)?;
        match self.exec.query_one(&sql, &args).await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                self.log_failure(&e);
                Err(e)
            }
        }
    }

    // ==================== Raw SQL ====================

    /// Execute raw SQL. List arguments are expanded for `in (?)`.
    pub async fn raw_exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.run_exec(Statement::new(sql, args.to_vec())).await
    }

    /// Run a raw query and map every row.
    pub async fn raw_select<T: FromRow>(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<T>> {
        let rows = self.run_query(Statement::new(sql, args.to_vec())).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run a raw query and map the first row; `None` when nothing matched.
    pub async fn raw_select_first<T: FromRow>(
        &self,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Option<T>> {
        let row = self.run_query_one(Statement::new(sql, args.to_vec())).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    // ==================== Select ====================

    /// Resolve `*` to the destination's declared columns.
    fn select_list<T: FromRow>(select: &str) -> String {
        let select = select.trim();
        if select.is_empty() || select == "*" {
            let cols = T::select_columns();
            if !cols.is_empty() {
                return cols.join(", ");
            }
            return "*".to_string();
        }
        select.to_string()
    }

    /// Select every matching row.
    pub async fn select<'w, T: FromRow>(
        &self,
        table: &str,
        select: &str,
        filter: impl Into<WhereInput<'w>>,
        args: &[Value],
    ) -> OrmResult<Vec<T>> {
        let params = SelectParams::new(table)
            .select(Self::select_list::<T>(select))
            .filter(filter);
        self.select_with(params, args).await
    }

    /// Select with ordering, limit, or row locking.
    pub async fn select_with<T: FromRow>(
        &self,
        mut params: SelectParams<'_>,
        args: &[Value],
    ) -> OrmResult<Vec<T>> {
        params.select = Self::select_list::<T>(&params.select);
        let stmt = self.builder().select(&params, args)?;
        let rows = self.run_query(stmt).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Select the first matching row (`limit 1`).
    pub async fn select_first<'w, T: FromRow>(
        &self,
        table: &str,
        select: &str,
        filter: impl Into<WhereInput<'w>>,
        args: &[Value],
    ) -> OrmResult<Option<T>> {
        let params = SelectParams::new(table)
            .select(Self::select_list::<T>(select))
            .filter(filter)
            .limit(1);
        let stmt = self.builder().select(&params, args)?;
        let row = self.run_query_one(stmt).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Select one row by its `id` column, optionally locking it.
    pub async fn select_by_id<T: FromRow>(
        &self,
        table: &str,
        select: &str,
        id: impl ToValue,
        for_update: bool,
    ) -> OrmResult<Option<T>> {
        let mut filter = Mapping::new();
        filter.insert("id", id);
        let params = SelectParams::new(table)
            .select(Self::select_list::<T>(select))
            .filter(filter)
            .limit(1)
            .for_update(for_update);
        let stmt = self.builder().select(&params, &[])?;
        let row = self.run_query_one(stmt).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    fn by_str<T: FromRow>(table: &str, select: &str, tail: &str, args: &[Value]) -> Statement {
        let head = format!("select {} from {table}", Self::select_list::<T>(select));
        let sql = match tail.trim() {
            "" => head,
            tail => format!("{head} {tail}"),
        };
        Statement::new(sql, args.to_vec())
    }

    /// `select <cols> from <table> <tail>` with `tail` used verbatim.
    pub async fn select_by_str<T: FromRow>(
        &self,
        table: &str,
        select: &str,
        tail: &str,
        args: &[Value],
    ) -> OrmResult<Vec<T>> {
        let rows = self
            .run_query(Self::by_str::<T>(table, select, tail, args))
            .await?;
        rows.iter().map(T::from_row).collect()
    }

    /// First row of [`Db::select_by_str`]; `None` when nothing matched.
    pub async fn select_first_by_str<T: FromRow>(
        &self,
        table: &str,
        select: &str,
        tail: &str,
        args: &[Value],
    ) -> OrmResult<Option<T>> {
        let row = self
            .run_query_one(Self::by_str::<T>(table, select, tail, args))
            .await?;
        row.as_ref().map(T::from_row).transpose()
    }

    // ==================== Insert ====================

    async fn insert_mode<'r>(
        &self,
        table: &str,
        input: impl Into<InsertInput<'r>>,
        mode: InsertMode,
    ) -> OrmResult<ExecResult> {
        let stmt = self.builder().insert(table, &input.into(), mode)?;
        self.run_exec(stmt).await
    }

    /// Insert one row or many.
    pub async fn insert<'r>(
        &self,
        table: &str,
        input: impl Into<InsertInput<'r>>,
    ) -> OrmResult<ExecResult> {
        self.insert_mode(table, input, InsertMode::Insert).await
    }

    /// Insert, skipping rows that conflict with an existing key.
    pub async fn insert_ignore<'r>(
        &self,
        table: &str,
        input: impl Into<InsertInput<'r>>,
    ) -> OrmResult<ExecResult> {
        self.insert_mode(table, input, InsertMode::Ignore).await
    }

    /// `replace into` (MySQL dialect only).
    pub async fn replace_into<'r>(
        &self,
        table: &str,
        input: impl Into<InsertInput<'r>>,
    ) -> OrmResult<ExecResult> {
        self.insert_mode(table, input, InsertMode::Replace).await
    }

    /// Insert and fail with [`OrmError::NoAffectedRows`] when nothing was written.
    pub async fn insert_affected<'r>(
        &self,
        table: &str,
        input: impl Into<InsertInput<'r>>,
    ) -> OrmResult<ExecResult> {
        let res = self.insert(table, input).await?;
        if res.rows_affected == 0 {
            return Err(OrmError::NoAffectedRows);
        }
        Ok(res)
    }

    // ==================== Update ====================

    /// Update matching rows; returns the affected row count.
    pub async fn update<'u, 'w>(
        &self,
        table: &str,
        set: impl Into<UpdateInput<'u>>,
        filter: impl Into<WhereInput<'w>>,
        args: &[Value],
    ) -> OrmResult<u64> {
        let stmt = self
            .builder()
            .update(table, &set.into(), &filter.into(), args)?;
        Ok(self.run_exec(stmt).await?.rows_affected)
    }

    /// Update and fail with [`OrmError::NoAffectedRows`] when nothing changed.
    pub async fn update_affected<'u, 'w>(
        &self,
        table: &str,
        set: impl Into<UpdateInput<'u>>,
        filter: impl Into<WhereInput<'w>>,
        args: &[Value],
    ) -> OrmResult<u64> {
        match self.update(table, set, filter, args).await? {
            0 => Err(OrmError::NoAffectedRows),
            n => Ok(n),
        }
    }

    // ==================== Aggregates ====================

    /// `select count(*) as count from <table> [where ...]`
    pub async fn count<'w>(
        &self,
        table: &str,
        filter: impl Into<WhereInput<'w>>,
        args: &[Value],
    ) -> OrmResult<u64> {
        let stmt = self.builder().count(table, &filter.into(), args)?;
        let value = match self.run_query_one(stmt).await? {
            Some(row) => aggregate_value(&row, "count"),
            None => Value::Null,
        };
        match value {
            Value::Null => Ok(0),
            v => u64::from_value(&v).map_err(|e| OrmError::decode("count", e)),
        }
    }

    /// `select sum(<column>) as sum from <table> [where ...]`
    ///
    /// The sum is returned as text so decimal columns keep their precision.
    /// No matching rows yields `"0"`.
    pub async fn sum<'w>(
        &self,
        table: &str,
        column: &str,
        filter: impl Into<WhereInput<'w>>,
        args: &[Value],
    ) -> OrmResult<String> {
        let stmt = self.builder().sum(table, column, &filter.into(), args)?;
        let value = match self.run_query_one(stmt).await? {
            Some(row) => aggregate_value(&row, "sum"),
            None => Value::Null,
        };
        Ok(match value {
            Value::Null => "0".to_string(),
            v => v.to_text(),
        })
    }
}

/// Aggregate column by alias, falling back to the first column.
fn aggregate_value(row: &Row, alias: &str) -> Value {
    row.get(alias)
        .or_else(|| row.first_value())
        .cloned()
        .unwrap_or(Value::Null)
}

// ==================== Transactions ====================

impl<C: Connector> Db<C> {
    /// Begin a transaction sharing this session's configuration.
    ///
    /// The returned session must be finished with [`Db::commit`] or
    /// [`Db::rollback`].
    pub async fn begin(&self) -> OrmResult<Db<C::Tx>> {
        let tx = self.exec.begin().await?;
        let id = uuid::Uuid::new_v4().to_string();
        self.config.log_tx(&id, "begin");
        Ok(Db {
            exec: tx,
            config: Arc::clone(&self.config),
            tx_id: Some(id),
        })
    }
}

impl<T: TxHandle> Db<T> {
    pub async fn commit(self) -> OrmResult<()> {
        self.config.log_tx(self.tx_id().unwrap_or("-"), "commit");
        self.exec.commit().await
    }

    pub async fn rollback(self) -> OrmResult<()> {
        self.config.log_tx(self.tx_id().unwrap_or("-"), "rollback");
        self.exec.rollback().await
    }
}

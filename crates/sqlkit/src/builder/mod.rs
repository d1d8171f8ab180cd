//! Statement builders.
//!
//! Every builder turns a loosely shaped payload (mapping, record, raw string,
//! or a sequence of them) into a [`Statement`]: SQL text plus its ordered
//! arguments.
//!
//! ## Conventions
//!
//! - Keywords are lowercase, clauses are joined by a single space, and
//!   absent clauses are omitted entirely.
//! - Placeholders are always `?`. Drivers that need numbered placeholders
//!   rewrite them (see [`crate::placeholder::number_placeholders`]).
//! - Identifiers are emitted as given, unquoted.
//! - Builders are pure: no I/O, no shared state.

pub mod insert;
pub mod select;
pub mod update;
pub mod where_builder;

pub use insert::{InsertInput, InsertMode};
pub use select::{Order, OrderBy, SelectParams};
pub use update::UpdateInput;
pub use where_builder::{WhereInput, compile_where};

use crate::error::OrmResult;
use crate::value::Value;

/// SQL flavour a statement is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
}

/// An immutable (SQL text, ordered arguments) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }
}

/// Join non-empty SQL fragments with a single space.
pub(crate) fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Entry point for all statement builders.
///
/// ```ignore
/// use sqlkit::builder::{Builder, SelectParams, WhereInput};
///
/// let filter = sqlkit::mapping! { "status" => "active", "id" => vec![1, 2] };
/// let stmt = Builder::default().select(
///     &SelectParams::new("users").filter(WhereInput::from(filter)).limit(10),
///     &[],
/// )?;
/// assert_eq!(
///     stmt.sql(),
///     "select * from users where status = ? and id in (?, ?) limit 10"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Builder {
    dialect: Dialect,
}

impl Builder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Compile a where-input on its own.
    pub fn where_clause(&self, filter: &WhereInput<'_>, extra_args: &[Value]) -> OrmResult<Statement> {
        compile_where(filter, extra_args)
    }

    pub fn select(&self, params: &SelectParams<'_>, extra_args: &[Value]) -> OrmResult<Statement> {
        select::build_select(params, extra_args)
    }

    pub fn insert(
        &self,
        table: &str,
        input: &InsertInput<'_>,
        mode: InsertMode,
    ) -> OrmResult<Statement> {
        insert::build_insert(self.dialect, table, input, mode)
    }

    pub fn update(
        &self,
        table: &str,
        input: &UpdateInput<'_>,
        filter: &WhereInput<'_>,
        extra_args: &[Value],
    ) -> OrmResult<Statement> {
        update::build_update(self.dialect, table, input, filter, extra_args)
    }

    pub fn count(
        &self,
        table: &str,
        filter: &WhereInput<'_>,
        extra_args: &[Value],
    ) -> OrmResult<Statement> {
        select::build_count(table, filter, extra_args)
    }

    pub fn sum(
        &self,
        table: &str,
        column: &str,
        filter: &WhereInput<'_>,
        extra_args: &[Value],
    ) -> OrmResult<Statement> {
        select::build_sum(table, column, filter, extra_args)
    }
}

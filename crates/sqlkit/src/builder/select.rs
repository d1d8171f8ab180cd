use super::where_builder::{WhereInput, compile_where};
use super::{Statement, join_parts};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// `order by <column> <asc|desc>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub order: Order,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: Order::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: Order::Desc,
        }
    }
}

/// Parameters of a SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectParams<'a> {
    /// Table expression (may include joins written as raw SQL).
    pub table: String,
    /// Select list; empty means `*`.
    pub select: String,
    pub filter: WhereInput<'a>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u64>,
    /// Append `for update` (row lock inside a transaction).
    pub for_update: bool,
}

impl<'a> SelectParams<'a> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = select.into();
        self
    }

    pub fn filter(mut self, filter: impl Into<WhereInput<'a>>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn for_update(mut self, yes: bool) -> Self {
        self.for_update = yes;
        self
    }
}

fn require_table(table: &str) -> OrmResult<()> {
    if table.trim().is_empty() {
        return Err(OrmError::validation("table name must not be empty"));
    }
    Ok(())
}

pub(crate) fn build_select(params: &SelectParams<'_>, extra_args: &[Value]) -> OrmResult<Statement> {
    require_table(&params.table)?;

    let (where_sql, args) = compile_where(&params.filter, extra_args)?.into_parts();
    let select = match params.select.trim() {
        "" => "*",
        s => s,
    };
    let order = params
        .order_by
        .as_ref()
        .map(|o| format!("order by {} {}", o.column, o.order.as_sql()))
        .unwrap_or_default();
    let limit = params
        .limit
        .map(|n| format!("limit {n}"))
        .unwrap_or_default();
    let head = format!("select {select} from {}", params.table);

    let sql = join_parts(&[
        &head,
        &where_sql,
        &order,
        &limit,
        if params.for_update { "for update" } else { "" },
    ]);
    Ok(Statement::new(sql, args))
}

pub(crate) fn build_count(
    table: &str,
    filter: &WhereInput<'_>,
    extra_args: &[Value],
) -> OrmResult<Statement> {
    require_table(table)?;
    let (where_sql, args) = compile_where(filter, extra_args)?.into_parts();
    let head = format!("select count(*) as count from {table}");
    Ok(Statement::new(join_parts(&[&head, &where_sql]), args))
}

pub(crate) fn build_sum(
    table: &str,
    column: &str,
    filter: &WhereInput<'_>,
    extra_args: &[Value],
) -> OrmResult<Statement> {
    require_table(table)?;
    if column.trim().is_empty() {
        return Err(OrmError::validation("sum column must not be empty"));
    }
    let (where_sql, args) = compile_where(filter, extra_args)?.into_parts();
    let head = format!("select sum({column}) as sum from {table}");
    Ok(Statement::new(join_parts(&[&head, &where_sql]), args))
}

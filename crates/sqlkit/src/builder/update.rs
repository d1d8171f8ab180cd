use super::where_builder::{WhereInput, compile_where};
use super::{Dialect, Statement, join_parts};
use crate::error::{OrmError, OrmResult};
use crate::format::{Formatted, WriteContext, format_write};
use crate::mapping::Mapping;
use crate::placeholder::placeholder_positions;
use crate::record::Record;
use crate::value::Value;

/// SET payload of an UPDATE.
#[derive(Clone)]
pub enum UpdateInput<'a> {
    Mapping(Mapping),
    Record(&'a dyn Record),
    /// Assignment list used verbatim, e.g. `"hits = hits + 1"`, with the
    /// arguments bound to its own placeholders.
    Raw(String, Vec<Value>),
}

impl std::fmt::Debug for UpdateInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mapping(m) => f.debug_tuple("Mapping").field(m).finish(),
            Self::Record(r) => f.debug_tuple("Record").field(&r.to_mapping()).finish(),
            Self::Raw(s, args) => f.debug_tuple("Raw").field(s).field(args).finish(),
        }
    }
}

impl<'a> UpdateInput<'a> {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into(), Vec::new())
    }

    /// Raw assignments with placeholders, e.g.
    /// `UpdateInput::raw_with("balance = balance - ?", args![amount])`.
    pub fn raw_with(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Raw(sql.into(), args)
    }

    pub fn record(record: &'a dyn Record) -> Self {
        Self::Record(record)
    }
}

impl From<Mapping> for UpdateInput<'_> {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl<'a, T: Record> From<&'a T> for UpdateInput<'a> {
    fn from(r: &'a T) -> Self {
        Self::Record(r)
    }
}

impl From<&str> for UpdateInput<'_> {
    fn from(s: &str) -> Self {
        Self::raw(s)
    }
}

impl From<String> for UpdateInput<'_> {
    fn from(s: String) -> Self {
        Self::raw(s)
    }
}

fn compile_assignments(mapping: &Mapping) -> OrmResult<(Vec<String>, Vec<Value>)> {
    let mut sets = Vec::with_capacity(mapping.len());
    let mut args = Vec::with_capacity(mapping.len());
    for (column, value) in mapping {
        match format_write(column, value, WriteContext::Update)? {
            Formatted::Skip => {}
            Formatted::Bind(v) => {
                sets.push(format!("{column} = ?"));
                args.push(v);
            }
            Formatted::Raw { op, literal } => sets.push(
                format!("{column} {op} {literal}")
                    .trim_end()
                    .to_string(),
            ),
            Formatted::List(_) | Formatted::BindOp { .. } => {
                return Err(OrmError::value_type(format!(
                    "column '{column}': list cannot be assigned"
                )));
            }
        }
    }
    Ok((sets, args))
}

/// Check a raw SET against its own arguments.
///
/// Without own arguments, placeholders are only allowed when the WHERE is raw
/// too, so `extra_args` fill both in textual order.
fn check_raw_set(
    dialect: Dialect,
    sql: &str,
    args: &[Value],
    filter: &WhereInput<'_>,
) -> OrmResult<()> {
    let placeholders = placeholder_positions(sql, dialect).len();
    if args.is_empty() {
        if placeholders > 0 && !matches!(filter, WhereInput::Raw(_)) {
            return Err(OrmError::validation(format!(
                "raw SET has {placeholders} placeholders but no arguments of its own"
            )));
        }
    } else if placeholders != args.len() {
        return Err(OrmError::validation(format!(
            "raw SET has {placeholders} placeholders but {} arguments",
            args.len()
        )));
    }
    Ok(())
}

/// `update <table> set ... [where ...]`
///
/// Arguments are ordered: SET arguments, then WHERE arguments, then `extra_args`.
pub(crate) fn build_update(
    dialect: Dialect,
    table: &str,
    input: &UpdateInput<'_>,
    filter: &WhereInput<'_>,
    extra_args: &[Value],
) -> OrmResult<Statement> {
    if table.trim().is_empty() {
        return Err(OrmError::validation("table name must not be empty"));
    }

    let (set_sql, mut args) = match input {
        UpdateInput::Raw(sql, set_args) => {
            check_raw_set(dialect, sql, set_args, filter)?;
            (sql.trim().to_string(), set_args.clone())
        }
        UpdateInput::Mapping(m) => {
            let (sets, args) = compile_assignments(m)?;
            (sets.join(", "), args)
        }
        UpdateInput::Record(r) => {
            let (sets, args) = compile_assignments(&r.to_mapping())?;
            (sets.join(", "), args)
        }
    };
    if set_sql.is_empty() {
        return Err(OrmError::validation("update has no columns to set"));
    }

    let (where_sql, where_args) = compile_where(filter, extra_args)?.into_parts();
    args.extend(where_args);

    let head = format!("update {table} set {set_sql}");
    Ok(Statement::new(join_parts(&[&head, &where_sql]), args))
}

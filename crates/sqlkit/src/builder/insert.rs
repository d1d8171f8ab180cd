use super::{Dialect, Statement};
use crate::error::{OrmError, OrmResult};
use crate::format::{Formatted, WriteContext, format_write};
use crate::mapping::Mapping;
use crate::record::Record;
use crate::value::Value;

/// How conflicting rows are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertMode {
    /// Plain insert; conflicts are driver errors.
    #[default]
    Insert,
    /// Skip rows that conflict with an existing key.
    Ignore,
    /// Delete the conflicting row, then insert (MySQL only).
    Replace,
}

/// Payload of an INSERT: one row or many.
#[derive(Clone)]
pub enum InsertInput<'a> {
    Mapping(Mapping),
    Record(&'a dyn Record),
    Rows(Vec<Mapping>),
    Records(Vec<&'a dyn Record>),
}

impl std::fmt::Debug for InsertInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InsertInput").field(&self.rows()).finish()
    }
}

impl<'a> InsertInput<'a> {
    pub fn record(record: &'a dyn Record) -> Self {
        Self::Record(record)
    }

    /// Multi-row input from any slice of records.
    pub fn records<T: Record>(records: &'a [T]) -> Self {
        Self::Records(records.iter().map(|r| r as &dyn Record).collect())
    }

    /// Whether this is a multi-row input.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Rows(_) | Self::Records(_))
    }

    fn rows(&self) -> Vec<Mapping> {
        match self {
            Self::Mapping(m) => vec![m.clone()],
            Self::Record(r) => vec![r.to_mapping()],
            Self::Rows(rows) => rows.clone(),
            Self::Records(records) => records.iter().map(|r| r.to_mapping()).collect(),
        }
    }
}

impl From<Mapping> for InsertInput<'_> {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl<'a, T: Record> From<&'a T> for InsertInput<'a> {
    fn from(r: &'a T) -> Self {
        Self::Record(r)
    }
}

impl From<Vec<Mapping>> for InsertInput<'_> {
    fn from(rows: Vec<Mapping>) -> Self {
        Self::Rows(rows)
    }
}

impl<'a, T: Record> From<&'a [T]> for InsertInput<'a> {
    fn from(records: &'a [T]) -> Self {
        Self::records(records)
    }
}

/// Non-null (column, value) pairs of one row, in row order.
fn row_values(row: &Mapping) -> OrmResult<Vec<(&str, Value)>> {
    let mut out = Vec::with_capacity(row.len());
    for (column, value) in row {
        match format_write(column, value, WriteContext::Insert)? {
            Formatted::Skip => {}
            Formatted::Bind(v) => out.push((column, v)),
            // Insert never yields operator or list forms.
            Formatted::Raw { .. } | Formatted::BindOp { .. } | Formatted::List(_) => {
                return Err(OrmError::value_type(format!(
                    "column '{column}': value cannot be inserted"
                )));
            }
        }
    }
    Ok(out)
}

/// Line every row up with the first row's column order.
fn align_rows(rows: &[Mapping]) -> OrmResult<(Vec<String>, Vec<Vec<Value>>)> {
    let first = rows.first().ok_or(OrmError::EmptySlice)?;
    let first_values = row_values(first)?;
    if first_values.is_empty() {
        return Err(OrmError::validation("insert row has no non-null columns"));
    }
    let columns: Vec<String> = first_values.iter().map(|(c, _)| c.to_string()).collect();
    let expected = columns.len();

    let mut aligned = Vec::with_capacity(rows.len());
    aligned.push(first_values.into_iter().map(|(_, v)| v).collect());

    for (index, row) in rows.iter().enumerate().skip(1) {
        let mut values = row_values(row)?;
        if values.len() != expected {
            return Err(OrmError::SliceLengthMismatch {
                index,
                expected,
                got: values.len(),
            });
        }
        let mut ordered = Vec::with_capacity(expected);
        for column in &columns {
            match values.iter().position(|(c, _)| *c == column.as_str()) {
                Some(pos) => ordered.push(values.swap_remove(pos).1),
                None => {
                    return Err(OrmError::SliceLengthMismatch {
                        index,
                        expected,
                        got: ordered.len(),
                    });
                }
            }
        }
        aligned.push(ordered);
    }

    Ok((columns, aligned))
}

pub(crate) fn build_insert(
    dialect: Dialect,
    table: &str,
    input: &InsertInput<'_>,
    mode: InsertMode,
) -> OrmResult<Statement> {
    if table.trim().is_empty() {
        return Err(OrmError::validation("table name must not be empty"));
    }

    let (head, tail) = match (dialect, mode) {
        (_, InsertMode::Insert) => ("insert into", ""),
        (Dialect::MySql, InsertMode::Ignore) => ("insert ignore into", ""),
        (Dialect::MySql, InsertMode::Replace) => ("replace into", ""),
        (Dialect::Postgres, InsertMode::Ignore) => ("insert into", " on conflict do nothing"),
        (Dialect::Postgres, InsertMode::Replace) => {
            return Err(OrmError::validation(
                "replace into is not supported by the postgres dialect",
            ));
        }
    };

    let rows = input.rows();
    let (columns, aligned) = align_rows(&rows)?;

    let group = format!("({})", vec!["?"; columns.len()].join(", "));
    let groups = vec![group.as_str(); aligned.len()].join(", ");
    let sql = format!(
        "{head} {table} ({}) values {groups}{tail}",
        columns.join(", ")
    );
    let args = aligned.into_iter().flatten().collect();
    Ok(Statement::new(sql, args))
}

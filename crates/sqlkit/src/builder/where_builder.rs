//! WHERE clause compiler shared by SELECT, UPDATE, COUNT and SUM.

use super::Statement;
use crate::error::{OrmError, OrmResult};
use crate::format::{Formatted, format_where};
use crate::mapping::Mapping;
use crate::record::Record;
use crate::value::Value;

/// Filter payload accepted by the builders.
#[derive(Clone, Default)]
pub enum WhereInput<'a> {
    /// No filter: no `where` clause at all.
    #[default]
    None,
    /// SQL used verbatim; extra arguments fill its placeholders.
    Raw(String),
    /// Conjunction of the mapping's bindings.
    Mapping(Mapping),
    /// Conjunction of the record's mapped fields.
    Record(&'a dyn Record),
    /// Disjunction of conjunction groups: `(g1) or (g2) ...`.
    Any(Vec<Mapping>),
}

impl std::fmt::Debug for WhereInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Raw(s) => f.debug_tuple("Raw").field(s).finish(),
            Self::Mapping(m) => f.debug_tuple("Mapping").field(m).finish(),
            Self::Record(r) => f.debug_tuple("Record").field(&r.to_mapping()).finish(),
            Self::Any(groups) => f.debug_tuple("Any").field(groups).finish(),
        }
    }
}

impl<'a> WhereInput<'a> {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    pub fn record(record: &'a dyn Record) -> Self {
        Self::Record(record)
    }

    pub fn any(groups: impl IntoIterator<Item = Mapping>) -> Self {
        Self::Any(groups.into_iter().collect())
    }
}

impl From<()> for WhereInput<'_> {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<Mapping> for WhereInput<'_> {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl<'a, T: Record> From<&'a T> for WhereInput<'a> {
    fn from(r: &'a T) -> Self {
        Self::Record(r)
    }
}

impl From<&str> for WhereInput<'_> {
    fn from(s: &str) -> Self {
        Self::Raw(s.to_string())
    }
}

impl From<String> for WhereInput<'_> {
    fn from(s: String) -> Self {
        Self::Raw(s)
    }
}

impl From<Vec<Mapping>> for WhereInput<'_> {
    fn from(groups: Vec<Mapping>) -> Self {
        Self::Any(groups)
    }
}

impl<'a, T: Into<WhereInput<'a>>> From<Option<T>> for WhereInput<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

/// Loosely typed input, e.g. decoded from a request body.
///
/// `null` → no filter, string → raw SQL, object → mapping, array of objects →
/// OR groups. Anything else is a `WhereType` error.
impl TryFrom<serde_json::Value> for WhereInput<'_> {
    type Error = OrmError;

    fn try_from(json: serde_json::Value) -> OrmResult<Self> {
        use serde_json::Value as J;
        match json {
            J::Null => Ok(Self::None),
            J::String(s) => Ok(Self::Raw(s)),
            obj @ J::Object(_) => Mapping::from_json(obj).map(Self::Mapping),
            J::Array(items) => items
                .into_iter()
                .map(Mapping::from_json)
                .collect::<OrmResult<Vec<_>>>()
                .map(Self::Any),
            other => Err(OrmError::where_type(format!(
                "unsupported where input: {other}"
            ))),
        }
    }
}

/// Compile one mapping into `and`-joinable fragments and their arguments.
pub(crate) fn compile_bindings(mapping: &Mapping) -> OrmResult<(Vec<String>, Vec<Value>)> {
    let mut clauses = Vec::with_capacity(mapping.len());
    let mut args = Vec::with_capacity(mapping.len());

    for (column, value) in mapping {
        match format_where(column, value)? {
            Formatted::Skip => {}
            Formatted::Bind(v) => {
                clauses.push(format!("{column} = ?"));
                args.push(v);
            }
            Formatted::BindOp { op, value } => {
                clauses.push(format!("{column} {op} ?"));
                args.push(value);
            }
            Formatted::List(items) => {
                let placeholders = vec!["?"; items.len()].join(", ");
                clauses.push(format!("{column} in ({placeholders})"));
                args.extend(items);
            }
            Formatted::Raw { op, literal } => {
                if literal.is_empty() {
                    clauses.push(format!("{column} {op}"));
                } else {
                    clauses.push(format!("{column} {op} {literal}"));
                }
            }
        }
    }

    Ok((clauses, args))
}

/// Compile a where-input into `where ...` (or an empty string) plus arguments.
///
/// `extra_args` are appended after the compiled arguments; for a raw string
/// they are its only arguments.
pub fn compile_where(filter: &WhereInput<'_>, extra_args: &[Value]) -> OrmResult<Statement> {
    let (body, mut args) = match filter {
        WhereInput::None => (String::new(), Vec::new()),
        WhereInput::Raw(sql) => (sql.trim().to_string(), Vec::new()),
        WhereInput::Mapping(m) => {
            let (clauses, args) = compile_bindings(m)?;
            (clauses.join(" and "), args)
        }
        WhereInput::Record(r) => {
            let (clauses, args) = compile_bindings(&r.to_mapping())?;
            (clauses.join(" and "), args)
        }
        WhereInput::Any(groups) => {
            let mut parts = Vec::with_capacity(groups.len());
            let mut args = Vec::new();
            for group in groups {
                let (clauses, group_args) = compile_bindings(group)?;
                if clauses.is_empty() {
                    continue;
                }
                parts.push(format!("({})", clauses.join(" and ")));
                args.extend(group_args);
            }
            (parts.join(" or "), args)
        }
    };

    args.extend_from_slice(extra_args);

    let sql = if body.is_empty() {
        String::new()
    } else {
        format!("where {body}")
    };
    Ok(Statement::new(sql, args))
}

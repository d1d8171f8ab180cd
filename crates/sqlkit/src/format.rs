//! Value formatting: decides how a single value enters a statement.

use crate::error::{OrmError, OrmResult};
use crate::value::{BoundOp, RawOp, Value};

/// Prefix of the raw-operator string convention: `"s:<op> <literal>"`.
pub const RAW_PREFIX: &str = "s:";

/// How a value contributes to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Formatted {
    /// Contributes nothing (NULL, or a list with no usable elements).
    Skip,
    /// One placeholder, one bound argument.
    Bind(Value),
    /// One placeholder per element, used for `in (...)`.
    List(Vec<Value>),
    /// Operator and literal emitted verbatim, no argument.
    Raw { op: String, literal: String },
    /// Operator followed by one placeholder.
    BindOp { op: String, value: Value },
}

/// Parse the `"s:<op> <literal>"` convention.
///
/// Returns `None` when `s` does not carry the prefix.
pub fn parse_raw(s: &str) -> Option<RawOp> {
    let rest = s.strip_prefix(RAW_PREFIX)?.trim();
    let (op, literal) = match rest.split_once(char::is_whitespace) {
        Some((op, literal)) => (op, literal.trim()),
        None => (rest, ""),
    };
    Some(RawOp {
        op: op.to_string(),
        literal: literal.to_string(),
    })
}

fn format_bound_op(column: &str, bound: &BoundOp) -> OrmResult<Formatted> {
    if bound.op.trim().is_empty() {
        return Err(OrmError::value_type(format!(
            "column '{column}': operator value has no operator"
        )));
    }
    match bound.value.as_ref() {
        Value::Null => Ok(Formatted::Skip),
        Value::List(_) | Value::Json(_) | Value::Raw(_) | Value::Op(_) => {
            Err(OrmError::value_type(format!(
                "column '{column}': unsupported {} operand for operator '{}'",
                bound.value.kind(),
                bound.op
            )))
        }
        operand => Ok(Formatted::BindOp {
            op: bound.op.trim().to_string(),
            value: operand.clone(),
        }),
    }
}

/// Format a value appearing in a WHERE mapping.
pub fn format_where(column: &str, value: &Value) -> OrmResult<Formatted> {
    match value {
        Value::Null => Ok(Formatted::Skip),
        Value::Op(bound) => format_bound_op(column, bound),
        Value::Raw(raw) => Ok(Formatted::Raw {
            op: raw.op.clone(),
            literal: raw.literal.clone(),
        }),
        Value::Text(s) => match parse_raw(s) {
            Some(raw) if raw.op.is_empty() => Err(OrmError::value_type(format!(
                "column '{column}': raw operator value {s:?} has no operator"
            ))),
            Some(raw) => Ok(Formatted::Raw {
                op: raw.op,
                literal: raw.literal,
            }),
            None => Ok(Formatted::Bind(value.clone())),
        },
        Value::List(items) => {
            let mut bound = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::List(_) | Value::Json(_) | Value::Raw(_) | Value::Op(_) => {
                        return Err(OrmError::value_type(format!(
                            "column '{column}': unsupported {} element inside a list",
                            item.kind()
                        )));
                    }
                    other if other.to_text().is_empty() => {}
                    other => bound.push(other.clone()),
                }
            }
            if bound.is_empty() {
                Ok(Formatted::Skip)
            } else {
                Ok(Formatted::List(bound))
            }
        }
        Value::Json(_) => Err(OrmError::value_type(format!(
            "column '{column}': a nested map cannot be compared in a where clause"
        ))),
        other => Ok(Formatted::Bind(other.clone())),
    }
}

/// Statement kind a written value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteContext {
    Insert,
    Update,
}

/// Format a value appearing in an INSERT row or UPDATE assignment.
///
/// Strings are always data here; the `s:` convention only applies to WHERE.
pub fn format_write(column: &str, value: &Value, ctx: WriteContext) -> OrmResult<Formatted> {
    match value {
        Value::Null => Ok(Formatted::Skip),
        Value::List(_) => Ok(Formatted::Bind(Value::Json(value.to_json()))),
        Value::Raw(raw) => match ctx {
            WriteContext::Update => Ok(Formatted::Raw {
                op: raw.op.clone(),
                literal: raw.literal.clone(),
            }),
            WriteContext::Insert => Err(OrmError::value_type(format!(
                "column '{column}': raw operator values are not allowed in insert"
            ))),
        },
        Value::Op(bound) => Err(OrmError::value_type(format!(
            "column '{column}': operator '{}' is only valid in a where clause",
            bound.op
        ))),
        other => Ok(Formatted::Bind(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_convention_splits_operator_and_literal() {
        let raw = parse_raw("s:in (1,2)").unwrap();
        assert_eq!(raw.op, "in");
        assert_eq!(raw.literal, "(1,2)");

        let raw = parse_raw("s:is not null").unwrap();
        assert_eq!(raw.op, "is");
        assert_eq!(raw.literal, "not null");

        assert!(parse_raw("plain").is_none());
    }

    #[test]
    fn null_and_empty_list_are_skipped() {
        assert_eq!(format_where("a", &Value::Null).unwrap(), Formatted::Skip);
        assert_eq!(
            format_where("a", &Value::List(vec![])).unwrap(),
            Formatted::Skip
        );
        assert_eq!(
            format_where("a", &Value::list(vec!["", ""])).unwrap(),
            Formatted::Skip
        );
    }

    #[test]
    fn list_drops_empty_elements() {
        let f = format_where("a", &Value::list(vec!["x", "", "y"])).unwrap();
        assert_eq!(
            f,
            Formatted::List(vec![Value::Text("x".into()), Value::Text("y".into())])
        );
    }

    #[test]
    fn nested_shapes_are_value_type_errors() {
        let nested = Value::List(vec![Value::list(vec![1])]);
        assert!(matches!(
            format_where("a", &nested),
            Err(OrmError::ValueType(_))
        ));
        let obj = Value::Json(serde_json::json!({"k": 1}));
        assert!(matches!(format_where("a", &obj), Err(OrmError::ValueType(_))));
        assert!(matches!(
            format_where("a", &Value::Text("s:".into())),
            Err(OrmError::ValueType(_))
        ));
    }

    #[test]
    fn bound_operator_keeps_its_operand_as_argument() {
        assert_eq!(
            format_where("age", &Value::op(" >= ", 18)).unwrap(),
            Formatted::BindOp {
                op: ">=".into(),
                value: Value::Int(18)
            }
        );
        assert_eq!(
            format_where("age", &Value::op(">", Value::Null)).unwrap(),
            Formatted::Skip
        );
        assert!(matches!(
            format_where("age", &Value::op(">", vec![1, 2])),
            Err(OrmError::ValueType(_))
        ));
        assert!(matches!(
            format_where("age", &Value::op("", 1)),
            Err(OrmError::ValueType(_))
        ));
        assert!(format_write("age", &Value::op(">", 1), WriteContext::Update).is_err());
    }

    #[test]
    fn write_context_binds_prefixed_strings_as_data() {
        let v = Value::Text("s:in (1,2)".into());
        assert_eq!(
            format_write("a", &v, WriteContext::Insert).unwrap(),
            Formatted::Bind(v.clone())
        );
    }

    #[test]
    fn raw_is_rejected_in_insert_only() {
        let v = Value::raw("=", "a + 1");
        assert!(format_write("a", &v, WriteContext::Insert).is_err());
        assert_eq!(
            format_write("a", &v, WriteContext::Update).unwrap(),
            Formatted::Raw {
                op: "=".into(),
                literal: "a + 1".into()
            }
        );
    }

    #[test]
    fn list_is_written_as_json() {
        let f = format_write("tags", &Value::list(vec![1, 2]), WriteContext::Insert).unwrap();
        assert_eq!(f, Formatted::Bind(Value::Json(serde_json::json!([1, 2]))));
    }
}

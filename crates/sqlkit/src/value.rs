//! Runtime values bound to statements and read back from rows.
//!
//! [`Value`] is the single loosely-typed currency of the crate: mappings hold
//! values, builders bind values, drivers return rows of values. [`ToValue`] and
//! [`FromValue`] convert between Rust field types and [`Value`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt;

/// Fixed textual representation of temporal values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Textual representation of dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL. Never compiled into a clause or argument.
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Temporal value, rendered as `YYYY-MM-DD HH:MM:SS`.
    DateTime(NaiveDateTime),
    /// Nested maps and arrays from loosely typed input.
    Json(serde_json::Value),
    /// Sequence of scalars, compiled to `IN (...)`.
    List(Vec<Value>),
    /// Operator plus literal SQL, emitted verbatim without binding.
    Raw(RawOp),
    /// Comparison operator with a bound operand: `col <op> ?`.
    Op(BoundOp),
}

/// An operator and a literal SQL fragment, e.g. `in` + `(1,2)`.
///
/// The literal is inserted into the statement as-is. Never build one from
/// untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOp {
    pub op: String,
    pub literal: String,
}

/// A comparison operator and the value bound to its placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOp {
    pub op: String,
    pub value: Box<Value>,
}

impl Value {
    /// Create a bound operator value: `col <op> ?` with `value` as argument.
    ///
    /// ```ignore
    /// let filter = mapping! { "age" => Value::op(">=", 18) };
    /// ```
    pub fn op(op: impl Into<String>, value: impl ToValue) -> Self {
        Value::Op(BoundOp {
            op: op.into(),
            value: Box::new(value.to_value()),
        })
    }

    /// Create a raw operator value: `col <op> <literal>`.
    pub fn raw(op: impl Into<String>, literal: impl Into<String>) -> Self {
        Value::Raw(RawOp {
            op: op.into(),
            literal: literal.into(),
        })
    }

    /// Build a list value from any iterator of convertible items.
    pub fn list<T: ToValue>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(|v| v.to_value()).collect())
    }

    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Whether the value counts as "empty" for `omit_empty` fields.
    ///
    /// Temporal values are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !*b,
            Value::Int(i) => *i == 0,
            Value::UInt(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::DateTime(_) => false,
            Value::Json(j) => match j {
                serde_json::Value::Null => true,
                serde_json::Value::Array(a) => a.is_empty(),
                serde_json::Value::Object(o) => o.is_empty(),
                serde_json::Value::String(s) => s.is_empty(),
                _ => false,
            },
            Value::List(items) => items.is_empty(),
            Value::Raw(_) | Value::Op(_) => false,
        }
    }

    /// Canonical scalar-to-string conversion.
    ///
    /// Integers in decimal, booleans as `1`/`0`, temporal values in
    /// [`DATETIME_FORMAT`], JSON and lists as compact JSON, NULL as `""`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::Json(j) => j.to_string(),
            Value::List(_) => self.to_json().to_string(),
            Value::Raw(raw) => {
                if raw.literal.is_empty() {
                    raw.op.clone()
                } else {
                    format!("{} {}", raw.op, raw.literal)
                }
            }
            Value::Op(bound) => format!("{} {}", bound.op, bound.value.to_text()),
        }
    }

    /// Convert to a JSON value (used when a list is written to a column).
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            Value::UInt(u) => J::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(J::Null, J::Number),
            Value::Text(s) => J::String(s.clone()),
            Value::DateTime(_) | Value::Raw(_) | Value::Op(_) => J::String(self.to_text()),
            Value::Json(j) => j.clone(),
            Value::List(items) => J::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /// Convert loosely typed JSON input into a value.
    ///
    /// Arrays become [`Value::List`], objects stay [`Value::Json`].
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            J::String(s) => Value::Text(s),
            J::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            obj @ J::Object(_) => Value::Json(obj),
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::DateTime(_) => "datetime",
            Value::Json(_) => "json",
            Value::List(_) => "list",
            Value::Raw(_) => "raw",
            Value::Op(_) => "operator",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Text(s) => write!(f, "{s:?}"),
            other => f.write_str(&other.to_text()),
        }
    }
}

/// Parse the textual forms a driver may hand back for a timestamp.
pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==================== ToValue ====================

/// Conversion from a Rust field type into a [`Value`].
///
/// Only types implementing this trait can be stored in a mapping or record,
/// so an unsupported field type is rejected at compile time.
pub trait ToValue {
    fn to_value(&self) -> Value;

    /// Emptiness test used by `omit_empty` fields.
    fn is_empty_value(&self) -> bool {
        self.to_value().is_empty()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn is_empty_value(&self) -> bool {
        match self {
            Some(v) => v.is_empty_value(),
            None => true,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

macro_rules! to_value_signed {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

macro_rules! to_value_unsigned {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::UInt(u64::from(*self))
            }
        }
    )*};
}

to_value_signed!(i8, i16, i32, i64);
to_value_unsigned!(u8, u16, u32, u64);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::UInt(*self as u64)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::DateTime(self.naive_utc())
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Text(self.format(DATE_FORMAT).to_string())
    }

    fn is_empty_value(&self) -> bool {
        false
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

macro_rules! value_from {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                v.to_value()
            }
        }
    )*};
}

value_from!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, NaiveDateTime,
    DateTime<Utc>, NaiveDate, uuid::Uuid, serde_json::Value
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: ToValue> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        v.to_value()
    }
}

impl<T: ToValue> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.to_value()
    }
}

// ==================== FromValue ====================

/// Conversion from a row [`Value`] back into a Rust field type.
///
/// Errors are plain messages; [`crate::RowExt::get_as`] attaches the column name.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch<T>(value: &Value) -> Result<T, String> {
    Err(format!(
        "cannot convert {} value {} into {}",
        value.kind(),
        value,
        std::any::type_name::<T>()
    ))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            Value::Json(serde_json::Value::Array(items)) => items
                .iter()
                .map(|j| T::from_value(&Value::from_json(j.clone())))
                .collect(),
            Value::Text(s) => match serde_json::from_str::<serde_json::Value>(s) {
                Ok(serde_json::Value::Array(items)) => items
                    .into_iter()
                    .map(|j| T::from_value(&Value::from_json(j)))
                    .collect(),
                _ => mismatch(value),
            },
            other => mismatch(other),
        }
    }
}

macro_rules! from_value_int {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, String> {
                match value {
                    Value::Int(i) => <$t>::try_from(*i).map_err(|e| e.to_string()),
                    Value::UInt(u) => <$t>::try_from(*u).map_err(|e| e.to_string()),
                    Value::Bool(b) => Ok(<$t>::from(*b)),
                    Value::Text(s) => s.trim().parse::<$t>().map_err(|e| e.to_string()),
                    other => mismatch(other),
                }
            }
        }
    )*};
}

from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! from_value_float {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, String> {
                match value {
                    Value::Float(f) => Ok(*f as $t),
                    Value::Int(i) => Ok(*i as $t),
                    Value::UInt(u) => Ok(*u as $t),
                    Value::Text(s) => s.trim().parse::<$t>().map_err(|e| e.to_string()),
                    other => mismatch(other),
                }
            }
        }
    )*};
}

from_value_float!(f32, f64);

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) | Value::UInt(0) => Ok(false),
            Value::Int(1) | Value::UInt(1) => Ok(true),
            Value::Text(s) => match s.as_str() {
                "1" | "true" | "t" => Ok(true),
                "0" | "false" | "f" => Ok(false),
                _ => mismatch(value),
            },
            other => mismatch(other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null | Value::List(_) | Value::Raw(_) | Value::Op(_) => mismatch(value),
            other => Ok(other.to_text()),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Text(s) => parse_datetime(s).ok_or_else(|| format!("invalid datetime {s:?}")),
            other => mismatch(other),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        NaiveDateTime::from_value(value).map(|dt| dt.and_utc())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        NaiveDateTime::from_value(value).map(|dt| dt.date())
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => uuid::Uuid::parse_str(s).map_err(|e| e.to_string()),
            other => mismatch(other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| e.to_string()),
            other => Ok(other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text() {
        assert_eq!(Value::Int(-7).to_text(), "-7");
        assert_eq!(Value::UInt(42).to_text(), "42");
        assert_eq!(Value::Bool(true).to_text(), "1");
        assert_eq!(Value::Bool(false).to_text(), "0");
        assert_eq!(Value::Null.to_text(), "");
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_text(), "2024-03-09 07:05:00");
        assert_eq!(Value::list(vec![1, 2]).to_text(), "[1,2]");
    }

    #[test]
    fn temporal_values_are_never_empty() {
        let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert!(!epoch.is_empty_value());
        assert!(!NaiveDateTime::default().is_empty_value());
        assert!(Option::<NaiveDateTime>::None.is_empty_value());
    }

    #[test]
    fn emptiness_of_scalars() {
        assert!(0_u64.is_empty_value());
        assert!(String::new().is_empty_value());
        assert!(false.is_empty_value());
        assert!(Vec::<i32>::new().is_empty_value());
        assert!(!1_i32.is_empty_value());
        assert!(!"x".is_empty_value());
    }

    #[test]
    fn from_json_keeps_objects_and_lists_apart() {
        let v = Value::from_json(serde_json::json!([1, "a"]));
        assert_eq!(v, Value::List(vec![Value::Int(1), Value::Text("a".into())]));
        let obj = Value::from_json(serde_json::json!({"k": 1}));
        assert!(matches!(obj, Value::Json(_)));
    }

    #[test]
    fn from_value_coercions() {
        assert_eq!(u64::from_value(&Value::Text("12".into())), Ok(12));
        assert_eq!(i32::from_value(&Value::UInt(5)), Ok(5));
        assert!(u8::from_value(&Value::Int(-1)).is_err());
        assert_eq!(bool::from_value(&Value::Int(1)), Ok(true));
        assert_eq!(String::from_value(&Value::Int(3)), Ok("3".to_string()));
        assert_eq!(Option::<i64>::from_value(&Value::Null), Ok(None));
        let dt = NaiveDateTime::from_value(&Value::Text("2024-01-02 03:04:05".into())).unwrap();
        assert_eq!(dt.format(DATETIME_FORMAT).to_string(), "2024-01-02 03:04:05");
        assert_eq!(
            Vec::<i32>::from_value(&Value::Text("[1,2,3]".into())),
            Ok(vec![1, 2, 3])
        );
    }
}

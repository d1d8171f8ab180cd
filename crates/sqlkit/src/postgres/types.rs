//! `Value` ⇄ Postgres wire conversion.
//!
//! Builders bind loosely typed values, so encoding is driven by the column
//! type the server reports for each parameter: `Value::Text("42")` bound to an
//! `int8` column is parsed and sent as an integer.

use crate::value::{DATE_FORMAT, Value, parse_datetime};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot encode {} value {value} as {}", value.kind(), ty.name()).into()
}

fn as_i64(value: &Value, ty: &Type) -> Result<i64, BoxError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::UInt(u) => i64::try_from(*u).map_err(Into::into),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        Value::Text(s) => s.trim().parse::<i64>().map_err(Into::into),
        other => Err(mismatch(other, ty)),
    }
}

fn as_f64(value: &Value, ty: &Type) -> Result<f64, BoxError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::UInt(u) => Ok(*u as f64),
        Value::Text(s) => s.trim().parse::<f64>().map_err(Into::into),
        other => Err(mismatch(other, ty)),
    }
}

fn as_bool(value: &Value, ty: &Type) -> Result<bool, BoxError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::UInt(u) => Ok(*u != 0),
        Value::Text(s) => match s.trim() {
            "1" | "t" | "true" | "TRUE" | "y" | "yes" => Ok(true),
            "0" | "f" | "false" | "FALSE" | "n" | "no" => Ok(false),
            _ => Err(mismatch(value, ty)),
        },
        other => Err(mismatch(other, ty)),
    }
}

fn as_datetime(value: &Value, ty: &Type) -> Result<NaiveDateTime, BoxError> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Text(s) => parse_datetime(s).ok_or_else(|| mismatch(value, ty)),
        other => Err(mismatch(other, ty)),
    }
}

fn as_decimal(value: &Value, ty: &Type) -> Result<Decimal, BoxError> {
    match value {
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::UInt(u) => Ok(Decimal::from(*u)),
        Value::Float(f) => Decimal::try_from(*f).map_err(Into::into),
        Value::Text(s) => Decimal::from_str(s.trim()).map_err(Into::into),
        other => Err(mismatch(other, ty)),
    }
}

fn as_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Text(s) => serde_json::from_str(s).unwrap_or_else(|_| s.clone().into()),
        other => other.to_json(),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Value::Null = self {
            return Ok(IsNull::Yes);
        }
        if let Value::Raw(_) | Value::Op(_) = self {
            return Err("operator values cannot be bound as parameters".into());
        }
        if let Kind::Array(_) = ty.kind() {
            return match self {
                Value::List(items) => items.as_slice().to_sql(ty, out),
                other => Err(mismatch(other, ty)),
            };
        }

        match *ty {
            Type::BOOL => as_bool(self, ty)?.to_sql(ty, out),
            Type::INT2 => i16::try_from(as_i64(self, ty)?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(as_i64(self, ty)?)?.to_sql(ty, out),
            Type::INT8 => as_i64(self, ty)?.to_sql(ty, out),
            Type::OID => u32::try_from(as_i64(self, ty)?)?.to_sql(ty, out),
            Type::FLOAT4 => (as_f64(self, ty)? as f32).to_sql(ty, out),
            Type::FLOAT8 => as_f64(self, ty)?.to_sql(ty, out),
            Type::NUMERIC => as_decimal(self, ty)?.to_sql(ty, out),
            Type::TIMESTAMP => as_datetime(self, ty)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => as_datetime(self, ty)?.and_utc().to_sql(ty, out),
            Type::DATE => as_datetime(self, ty)?.date().to_sql(ty, out),
            Type::JSON | Type::JSONB => as_json(self).to_sql(ty, out),
            Type::UUID => match self {
                Value::Text(s) => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
                other => Err(mismatch(other, ty)),
            },
            _ => self.to_text().to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if let Kind::Array(_) = ty.kind() {
            return Ok(Value::List(Vec::<Value>::from_sql(ty, raw)?));
        }

        Ok(match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::UInt(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            // Text keeps full precision.
            Type::NUMERIC => Value::Text(Decimal::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMP => Value::DateTime(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::DateTime(DateTime::<Utc>::from_sql(ty, raw)?.naive_utc()),
            Type::DATE => Value::Text(NaiveDate::from_sql(ty, raw)?.format(DATE_FORMAT).to_string()),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::UUID => Value::Text(uuid::Uuid::from_sql(ty, raw)?.to_string()),
            _ => Value::Text(String::from_sql(ty, raw)?),
        })
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        match ty.kind() {
            Kind::Array(member) => <Self as FromSql>::accepts(member),
            _ => matches!(
                *ty,
                Type::BOOL
                    | Type::INT2
                    | Type::INT4
                    | Type::INT8
                    | Type::OID
                    | Type::FLOAT4
                    | Type::FLOAT8
                    | Type::NUMERIC
                    | Type::TIMESTAMP
                    | Type::TIMESTAMPTZ
                    | Type::DATE
                    | Type::JSON
                    | Type::JSONB
                    | Type::UUID
            ) || <String as FromSql>::accepts(ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value, ty: &Type) -> Result<BytesMut, BoxError> {
        let mut buf = BytesMut::new();
        value.to_sql(ty, &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn text_is_coerced_to_integer_columns() {
        let buf = encode(&Value::Text("42".into()), &Type::INT8).unwrap();
        assert_eq!(i64::from_sql(&Type::INT8, &buf).unwrap(), 42);

        let buf = encode(&Value::UInt(7), &Type::INT2).unwrap();
        assert_eq!(i16::from_sql(&Type::INT2, &buf).unwrap(), 7);
    }

    #[test]
    fn out_of_range_integer_is_an_error() {
        assert!(encode(&Value::Int(70_000), &Type::INT2).is_err());
    }

    #[test]
    fn datetime_text_round_trips() {
        let buf = encode(&Value::Text("2024-05-06 07:08:09".into()), &Type::TIMESTAMP).unwrap();
        let v = Value::from_sql(&Type::TIMESTAMP, &buf).unwrap();
        assert_eq!(v.to_text(), "2024-05-06 07:08:09");
    }

    #[test]
    fn numeric_decodes_to_text() {
        let buf = encode(&Value::Text("12.5".into()), &Type::NUMERIC).unwrap();
        let v = Value::from_sql(&Type::NUMERIC, &buf).unwrap();
        assert_eq!(v, Value::Text("12.5".into()));
    }

    #[test]
    fn null_and_raw() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap(),
            IsNull::Yes
        ));
        assert!(encode(&Value::raw("=", "1"), &Type::TEXT).is_err());
        assert_eq!(Value::from_sql_null(&Type::INT4).unwrap(), Value::Null);
    }

    #[test]
    fn bool_column_accepts_digit_text() {
        let buf = encode(&Value::Text("1".into()), &Type::BOOL).unwrap();
        assert!(bool::from_sql(&Type::BOOL, &buf).unwrap());
    }
}

//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::mapping::Row;
use crate::value::{FromValue, Value};

/// Trait for converting a result row into a Rust struct.
///
/// Usually derived with `#[derive(FromRow)]`.
pub trait FromRow: Sized {
    /// Convert a result row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;

    /// Columns to select when the caller asks for `*`.
    ///
    /// An empty list keeps the literal `*`.
    fn select_columns() -> Vec<&'static str> {
        Vec::new()
    }
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Get a column value, returning `OrmError::Decode` when it is missing or
    /// cannot be converted.
    fn get_as<T: FromValue>(&self, column: &str) -> OrmResult<T>;

    /// Like [`RowExt::get_as`], but a missing or NULL column yields `None`.
    fn get_opt<T: FromValue>(&self, column: &str) -> OrmResult<Option<T>>;

    /// Value of the first column, if any.
    fn first_value(&self) -> Option<&Value>;
}

impl RowExt for Row {
    fn get_as<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "column not found in row"))?;
        T::from_value(value).map_err(|e| OrmError::decode(column, e))
    }

    fn get_opt<T: FromValue>(&self, column: &str) -> OrmResult<Option<T>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value)
                .map(Some)
                .map_err(|e| OrmError::decode(column, e)),
        }
    }

    fn first_value(&self) -> Option<&Value> {
        self.values().next()
    }
}

//! Convenient imports for typical `sqlkit` usage.
//!
//! ```ignore
//! use sqlkit::prelude::*;
//! ```

pub use crate::{
    Builder, Db, DbConfig, Dialect, ExecResult, FromRow, FromValue, InsertMode, Mapping, Must,
    OrmError, OrmResult, Record, Row, RowExt, SelectParams, ToValue, Value, WhereInput, args,
    mapping, transaction,
};

#[cfg(feature = "postgres")]
pub use crate::postgres::{Configuration, PgDriver};

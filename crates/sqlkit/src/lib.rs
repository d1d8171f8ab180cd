//! # sqlkit
//!
//! Build SELECT/INSERT/UPDATE/COUNT/SUM statements from loosely shaped
//! payloads and run them through a pluggable driver.
//!
//! ## Features
//!
//! - **Payload-driven**: filters, rows and assignments are [`Mapping`]s,
//!   records (`#[derive(Record)]`), raw SQL fragments, or lists of them
//! - **Operator convention**: a text value starting with `s:` carries its own
//!   operator, e.g. `"s:> 18"` or `"s:is not null"`; [`Value::op`] does the
//!   same with a bound operand
//! - **Safe defaults**: UPDATE requires SET, multi-row INSERT rejects ragged rows
//! - **Transaction-friendly**: a transaction is just another [`Db`]
//! - **Logged**: every statement is a `tracing` event on target `sqlkit.sql`
//!
//! ## Building statements
//!
//! ```ignore
//! use sqlkit::{mapping, Builder, SelectParams};
//!
//! let stmt = Builder::default().select(
//!     &SelectParams::new("users")
//!         .filter(mapping! { "status" => "active", "age" => "s:>= 18" })
//!         .limit(10),
//!     &[],
//! )?;
//! assert_eq!(stmt.sql(), "select * from users where status = ? and age >= 18 limit 10");
//! ```
//!
//! ## Running them
//!
//! ```ignore
//! use sqlkit::{mapping, Db, FromRow, Record};
//! use sqlkit::postgres::{Configuration, PgDriver};
//!
//! #[derive(Debug, Record, FromRow)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let db = Db::new(PgDriver::connect(&cfg).await?);
//! let users: Vec<User> = db.select("users", "*", mapping! { "id" => vec![1, 2, 3] }, &[]).await?;
//! let n = db.count("users", (), &[]).await?;
//! ```

extern crate self as sqlkit;

pub mod builder;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod mapping;
pub mod must;
pub mod placeholder;
pub mod record;
pub mod row;
pub mod transaction;
pub mod value;

pub mod prelude;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use builder::{
    Builder, Dialect, InsertInput, InsertMode, Order, OrderBy, SelectParams, Statement,
    UpdateInput, WhereInput,
};
pub use client::{Connector, ExecResult, Executor, TxHandle};
pub use config::DbConfig;
pub use db::Db;
pub use error::{OrmError, OrmResult};
pub use mapping::{Mapping, Row};
pub use must::Must;
pub use record::{FieldSpec, Record};
pub use row::{FromRow, RowExt};
pub use value::{BoundOp, FromValue, RawOp, ToValue, Value};

#[cfg(feature = "derive")]
pub use sqlkit_derive::{FromRow, Record};

/// Build a `Vec<Value>` argument list.
///
/// ```ignore
/// db.raw_select::<Row>("select * from t where a = ? and b in (?)", &sqlkit::args![1, vec![2, 3]]).await?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::ToValue::to_value(&$value)),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn args_macro_converts_each_value() {
        let args = args![1, "a", vec![2, 3]];
        assert_eq!(
            args,
            vec![
                Value::Int(1),
                Value::Text("a".into()),
                Value::List(vec![Value::Int(2), Value::Int(3)]),
            ]
        );
        assert!(args![].is_empty());
    }
}

//! Postgres driver built on `tokio-postgres` and `deadpool-postgres`.
//!
//! Statements are built with `?` placeholders and renumbered to `$1, $2, ...`
//! right before they are sent.

pub mod config;
mod driver;
mod types;

pub use config::Configuration;
pub use driver::{PgDriver, PgTx};

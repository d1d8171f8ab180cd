//! Derive macros for sqlkit
//!
//! Provides `#[derive(Record)]` and `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod common;
mod from_row;
mod record;

/// Derive `Record` for a struct: flatten it into an ordered column mapping.
///
/// # Example
///
/// ```ignore
/// use sqlkit::Record;
///
/// #[derive(Record)]
/// #[orm(rename_all = "camelCase")]
/// struct User {
///     user_id: i64,
///     #[orm(column = "nick", omit_empty)]
///     nickname: String,
///     #[orm(flatten)]
///     audit: Audit,
///     #[orm(skip)]
///     cached: bool,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(rename_all = "...")]` - Container casing for column names
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(omit_empty)]` - Leave the field out when it holds an empty value
/// - `#[orm(flatten)]` - Splice a nested record's columns in at the same level
/// - `#[orm(skip)]` - Never map the field
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `FromRow` for a struct.
///
/// Uses the same `#[orm(...)]` attributes as `Record`. `Option` fields read a
/// missing or NULL column as `None`; `omit_empty` and `skip` fields fall back
/// to `Default`.
///
/// # Example
///
/// ```ignore
/// use sqlkit::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

//! Record ⇄ mapping conversion.
//!
//! A [`Record`] is any value that can describe itself as an ordered
//! [`Mapping`] of external column names to values. Structs normally get the
//! implementation from `#[derive(Record)]`:
//!
//! ```ignore
//! use sqlkit::Record;
//!
//! #[derive(Record)]
//! struct Audit {
//!     #[orm(column = "created_at")]
//!     created: chrono::NaiveDateTime,
//! }
//!
//! #[derive(Record)]
//! struct User {
//!     id: i64,
//!     #[orm(omit_empty)]
//!     nickname: String,
//!     #[orm(flatten)]
//!     audit: Audit,
//! }
//! ```
//!
//! `User::to_mapping()` yields `id`, `nickname` (only when non-empty) and
//! `created_at`, all at the same level.

use crate::mapping::Mapping;

/// One entry of a record schema, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// External column name.
    pub name: &'static str,
    /// Field is skipped when it holds its empty value.
    pub omit_empty: bool,
    /// Field holds a date/time and is rendered in the fixed textual format.
    pub temporal: bool,
    /// Field was spliced in from a flattened nested record.
    pub nested: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            omit_empty: false,
            temporal: false,
            nested: false,
        }
    }

    pub const fn omit_empty(mut self, yes: bool) -> Self {
        self.omit_empty = yes;
        self
    }

    pub const fn temporal(mut self, yes: bool) -> Self {
        self.temporal = yes;
        self
    }

    /// Mark as coming from a flattened record.
    pub const fn nested(mut self) -> Self {
        self.nested = true;
        self
    }
}

/// A value that can be flattened into an ordered column mapping.
///
/// The schema is recomputed on every call; it is never cached.
pub trait Record: Sync {
    /// Flatten into column → value pairs, dropping omitted empty fields.
    fn to_mapping(&self) -> Mapping;

    /// Ordered field description.
    fn schema() -> Vec<FieldSpec>
    where
        Self: Sized;

    /// External names of every mapped field, nested records included.
    fn field_names() -> Vec<&'static str>
    where
        Self: Sized,
    {
        Self::schema().into_iter().map(|f| f.name).collect()
    }
}

/// Plain mappings are already flat; entries are copied as-is.
impl Record for Mapping {
    fn to_mapping(&self) -> Mapping {
        self.clone()
    }

    fn schema() -> Vec<FieldSpec> {
        Vec::new()
    }
}

impl<T: Record> Record for &T {
    fn to_mapping(&self) -> Mapping {
        (**self).to_mapping()
    }

    fn schema() -> Vec<FieldSpec> {
        T::schema()
    }
}

impl<T: Record> Record for Box<T> {
    fn to_mapping(&self) -> Mapping {
        (**self).to_mapping()
    }

    fn schema() -> Vec<FieldSpec> {
        T::schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ToValue, Value};

    struct Point {
        x: i32,
        label: String,
    }

    impl Record for Point {
        fn to_mapping(&self) -> Mapping {
            let mut m = Mapping::new();
            m.insert("x", self.x);
            if !self.label.is_empty_value() {
                m.insert("label", &self.label);
            }
            m
        }

        fn schema() -> Vec<FieldSpec> {
            vec![FieldSpec::new("x"), FieldSpec::new("label").omit_empty(true)]
        }
    }

    #[test]
    fn field_names_follow_schema() {
        assert_eq!(Point::field_names(), vec!["x", "label"]);
        assert_eq!(<&Point>::field_names(), vec!["x", "label"]);
        assert_eq!(<Box<Point>>::field_names(), vec!["x", "label"]);
    }

    #[test]
    fn omitted_field_is_absent() {
        let p = Point {
            x: 3,
            label: String::new(),
        };
        let m = p.to_mapping();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("x"), Some(&Value::Int(3)));
    }

    #[test]
    fn mapping_copies_entries() {
        let m = crate::mapping! { "b" => 1, "a" => "x" };
        assert_eq!(Record::to_mapping(&m), m);
    }
}

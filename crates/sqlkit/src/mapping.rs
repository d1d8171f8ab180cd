//! Insertion-ordered column → value map.

use crate::error::{OrmError, OrmResult};
use crate::value::{ToValue, Value};
use indexmap::IndexMap;

/// An ordered map from column name to [`Value`].
///
/// Iteration follows insertion order. Inserting a key that already exists
/// replaces its value without moving it. Compiled SQL is therefore
/// reproducible for a given sequence of inserts.
///
/// Equality is order-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<String, Value>,
}

/// A result row, keyed by column name in select order.
pub type Row = Mapping;

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert or replace a value. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToValue) -> Option<Value> {
        self.entries.insert(key.into(), value.to_value())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl ToValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Append every entry of `other`, replacing keys that already exist.
    pub fn extend_from(&mut self, other: Mapping) {
        for (k, v) in other.entries {
            self.entries.insert(k, v);
        }
    }

    /// Build from a JSON object. Any other JSON shape is a `WhereType` error.
    pub fn from_json(json: serde_json::Value) -> OrmResult<Self> {
        match json {
            serde_json::Value::Object(obj) => Ok(obj
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect()),
            other => Err(OrmError::where_type(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<K: Into<String>, V: ToValue> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Mapping::new();
        for (k, v) in iter {
            m.insert(k, v);
        }
        m
    }
}

impl<K: Into<String>, V: ToValue> Extend<(K, V)> for Mapping {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a str, &'a Value);
    type IntoIter = std::iter::Map<
        indexmap::map::Iter<'a, String, Value>,
        fn((&'a String, &'a Value)) -> (&'a str, &'a Value),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(borrow_entry as fn(_) -> _)
    }
}

fn borrow_entry<'a>((k, v): (&'a String, &'a Value)) -> (&'a str, &'a Value) {
    (k.as_str(), v)
}

/// Build a [`Mapping`] literal.
///
/// ```ignore
/// let m = sqlkit::mapping! { "name" => "alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! mapping {
    () => { $crate::Mapping::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut m = $crate::Mapping::new();
        $( m.insert($key, $value); )+
        m
    }};
}

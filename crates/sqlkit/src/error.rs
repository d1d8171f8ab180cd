//! Error types for sqlkit

use thiserror::Error;

/// Result type alias for sqlkit operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A value of an unsupported shape was found inside a mapping, list, or write context
    #[error("Value type error: {0}")]
    ValueType(String),

    /// The where-input kind is not a mapping, record, raw string, or sequence of mappings
    #[error("Where type error: {0}")]
    WhereType(String),

    /// A multi-row insert element does not line up with the first element's columns
    #[error("Slice length mismatch at row {index}: expected {expected} columns, got {got}")]
    SliceLengthMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// A multi-row insert was given no rows
    #[error("Empty slice: multi-row insert needs at least one row")]
    EmptySlice,

    /// An assert-affected call changed nothing
    #[error("No affected rows")]
    NoAffectedRows,

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database connection error
    #[cfg(feature = "postgres")]
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "postgres")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query execution error from the Postgres driver
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Opaque error from any other driver
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a value type error
    pub fn value_type(message: impl Into<String>) -> Self {
        Self::ValueType(message.into())
    }

    /// Create a where type error
    pub fn where_type(message: impl Into<String>) -> Self {
        Self::WhereType(message.into())
    }

    /// Wrap an error coming out of a third-party driver
    pub fn driver(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Driver(err.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error was raised while building a statement, before any driver call
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::ValueType(_)
                | Self::WhereType(_)
                | Self::SliceLengthMismatch { .. }
                | Self::EmptySlice
                | Self::Validation(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_mismatch_message_names_row() {
        let err = OrmError::SliceLengthMismatch {
            index: 2,
            expected: 3,
            got: 1,
        };
        assert_eq!(
            err.to_string(),
            "Slice length mismatch at row 2: expected 3 columns, got 1"
        );
        assert!(err.is_build_error());
    }

    #[test]
    fn driver_error_is_not_a_build_error() {
        let err = OrmError::driver("connection reset");
        assert!(!err.is_build_error());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Driver error: connection reset");
    }
}

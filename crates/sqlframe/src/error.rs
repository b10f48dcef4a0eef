//! Error types for sqlframe

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sqlframe operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// The number of `?` placeholders differs from the number of arguments
    #[error("Argument count mismatch: {placeholders} placeholder(s), {args} argument(s)")]
    ArgumentCountMismatch { placeholders: usize, args: usize },

    /// A value cannot be written as a SQL literal or bound as a parameter
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// INSERT/REPLACE/UPDATE was given no column data
    #[error("No column data for table '{0}'")]
    NoColumns(String),

    /// UPDATE/DELETE was given no predicate
    #[error("Missing WHERE predicate for table '{0}'")]
    MissingWhere(String),

    /// Query execution error
    #[cfg(feature = "mysql")]
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction state error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error was raised while building a statement, before any I/O
    pub fn is_builder_error(&self) -> bool {
        matches!(
            self,
            Self::ArgumentCountMismatch { .. }
                | Self::UnsupportedValueType(_)
                | Self::NoColumns(_)
                | Self::MissingWhere(_)
        )
    }

    /// Check if the driver reported a duplicate key (MySQL error 1062)
    pub fn is_unique_violation(&self) -> bool {
        self.mysql_code() == Some(1062)
    }

    /// Check if the driver reported a foreign key failure (MySQL errors 1451/1452)
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.mysql_code(), Some(1451 | 1452))
    }

    #[cfg(feature = "mysql")]
    fn mysql_code(&self) -> Option<u16> {
        match self {
            Self::Query(sqlx::Error::Database(db_err)) => db_err
                .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                .map(|e| e.number()),
            _ => None,
        }
    }

    #[cfg(not(feature = "mysql"))]
    fn mysql_code(&self) -> Option<u16> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_errors_are_classified() {
        assert!(DbError::NoColumns("user".into()).is_builder_error());
        assert!(
            DbError::ArgumentCountMismatch {
                placeholders: 2,
                args: 1
            }
            .is_builder_error()
        );
        assert!(!DbError::Timeout(Duration::from_secs(1)).is_builder_error());
        assert!(DbError::Timeout(Duration::from_secs(1)).is_timeout());
    }

    #[test]
    fn mismatch_message_names_both_counts() {
        let err = DbError::ArgumentCountMismatch {
            placeholders: 3,
            args: 2,
        };
        assert_eq!(
            err.to_string(),
            "Argument count mismatch: 3 placeholder(s), 2 argument(s)"
        );
    }

    #[test]
    fn non_driver_errors_have_no_code() {
        assert!(!DbError::Other("x".into()).is_unique_violation());
        assert!(!DbError::Other("x".into()).is_foreign_key_violation());
    }
}

//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (railfare-core) ← What the fare engine understands         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError → fare-quote prints it and exits non-zero                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use railfare_core::StoreError;
use thiserror::Error;

/// Message raised by the overlap triggers in the initial migration.
const OVERLAP_TRIGGER_MESSAGE: &str = "fare range overlap";

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate station code or train number
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - A stop referencing a non-existent station
    /// - A composition referencing a non-existent bogie
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (bad class number, negative distance...).
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    /// A fare range write would overlap another range of its scope.
    ///
    /// ## When This Occurs
    /// - The transactional overlap scan found a neighbour (`existing_id` set)
    /// - The overlap trigger aborted the statement (`existing_id` unknown)
    #[error("Fare range overlaps an existing range in scope {scope}")]
    RangeOverlap {
        scope: String,
        existing_id: Option<i64>,
    },

    /// A stored row cannot be turned into a domain value.
    #[error("Invalid {table} row: {reason}")]
    InvalidRow { table: &'static str, reason: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_row(table: &'static str, reason: impl ToString) -> Self {
        DbError::InvalidRow {
            table,
            reason: reason.to_string(),
        }
    }

    /// Attaches the scope to an overlap raised by a trigger, which cannot
    /// know it.
    pub(crate) fn in_scope(self, scope: &str) -> Self {
        match self {
            DbError::RangeOverlap { existing_id, .. } => DbError::RangeOverlap {
                scope: scope.to_string(),
                existing_id,
            },
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // CHECK constraint: "CHECK constraint failed: <expr>"
                // RAISE(ABORT, ...) in a trigger: the raised message verbatim
                if msg.contains(OVERLAP_TRIGGER_MESSAGE) {
                    DbError::RangeOverlap {
                        scope: "unknown".to_string(),
                        existing_id: None,
                    }
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// What the fare engine sees of a database failure.
///
/// Only overlaps carry meaning for the engine; everything else is a backend
/// failure with the message preserved.
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::RangeOverlap { scope, existing_id } => {
                StoreError::Conflict { scope, existing_id }
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_maps_to_store_conflict() {
        let err = DbError::RangeOverlap {
            scope: "unknown".to_string(),
            existing_id: None,
        }
        .in_scope("distance:class=2");

        assert_eq!(
            StoreError::from(err),
            StoreError::Conflict {
                scope: "distance:class=2".to_string(),
                existing_id: None,
            }
        );
    }

    #[test]
    fn test_other_errors_map_to_backend() {
        let err = StoreError::from(DbError::PoolExhausted);
        assert_eq!(err, StoreError::Backend("Connection pool exhausted".to_string()));

        // in_scope leaves non-overlap errors alone
        let err = DbError::not_found("Train", 3).in_scope("distance:class=2");
        assert_eq!(err.to_string(), "Train not found: 3");
    }
}

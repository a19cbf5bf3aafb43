//! # Database Error Types
//!
//! Error types for database operations and the engine surface.
//!
//! ## Error Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                             │
//! │                                                                  │
//! │  SQLite Error (sqlx::Error)                                      │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  DbError (this module) ← adds context and categorization         │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  ServiceError = CoreError ∪ DbError ← what the engines return    │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  Caller (HTTP controller) maps kinds to its own status surface   │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use shopkeep_core::CoreError;

/// Database operation errors.
///
/// These wrap sqlx errors and provide categorization for callers. The
/// `UniqueViolation` variant is the conflict surface for duplicate SKUs
/// and sale numbers.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate SKU, sale number, ...).
    #[error("Duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error. Driver details stay out of the message
    /// shown to callers.
    #[error("Internal database error")]
    Internal(#[source] sqlx::Error),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → analyze message for constraint type
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

                // SQLite constraint messages:
                // UNIQUE: "UNIQUE constraint failed: <table>.<column>"
                // FK:     "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for plain database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Service Error
// =============================================================================

/// The error surface of the inventory ledger and the sale engine.
///
/// Business rule violations arrive as [`CoreError`] (not-found, shortfall,
/// bad transition, validation); infrastructure and constraint failures as
/// [`DbError`]. Either way the triggering transaction has been fully rolled
/// back by the time the error reaches the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<shopkeep_core::ValidationError> for ServiceError {
    fn from(err: shopkeep_core::ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Product", "p-123");
        assert_eq!(err.to_string(), "Product not found: p-123");
    }

    #[test]
    fn test_service_error_wraps_core() {
        let core = CoreError::ProductNotFound("p-123".to_string());
        let err: ServiceError = core.into();
        assert!(matches!(err, ServiceError::Core(_)));
        assert_eq!(err.to_string(), "Product not found: p-123");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}

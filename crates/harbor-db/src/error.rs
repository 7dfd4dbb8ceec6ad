//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error (SQLite or PostgreSQL)      CoreError (business rule)     │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  DbError (this module) ← constraint kind detected, rule wrapped        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AdminError (harbor-admin) ← printed to stderr, non-zero exit          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use harbor_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and operator feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate SKU or receipt number
    /// - Same batch number for a product at the same outlet
    /// - Second OPEN shift on a till
    #[error("Duplicate {field}: {value}")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent outlet, till or product
    /// - Deleting a till that still has shifts
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative discount, negative stock, ...).
    #[error("Check constraint violated: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - Server unreachable or credentials rejected
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    ///
    /// ## When This Occurs
    /// - Invalid SQL in migration
    /// - Applied migration was edited (checksum mismatch)
    /// - Existing rows collide with a new unique constraint
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Operation is not available for this database vendor.
    #[error("Operation '{operation}' is not supported on {vendor}")]
    UnsupportedVendor { operation: String, vendor: String },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for unique, foreign key and check violations.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation { .. }
        )
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint kind (SQLite message or PG SQLSTATE)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Io / Tls / Configuration    → DbError::ConnectionFailed
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
                let msg = db_err.message().to_string();

                match db_err.kind() {
                    // SQLite: "UNIQUE constraint failed: batches.product_id, ..."
                    // PostgreSQL: 23505, constraint name carried separately
                    ErrorKind::UniqueViolation => unique_violation(db_err.constraint(), &msg),
                    ErrorKind::ForeignKeyViolation => {
                        DbError::ForeignKeyViolation { message: msg }
                    }
                    ErrorKind::CheckViolation => DbError::CheckViolation { message: msg },
                    _ if msg.contains("UNIQUE constraint failed") => unique_violation(None, &msg),
                    _ if msg.contains("FOREIGN KEY constraint failed") => {
                        DbError::ForeignKeyViolation { message: msg }
                    }
                    _ if msg.contains("CHECK constraint failed") => {
                        DbError::CheckViolation { message: msg }
                    }
                    _ => DbError::QueryFailed(msg),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            sqlx::Error::Configuration(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Names the violated key: the PG constraint name, else the SQLite column list.
fn unique_violation(constraint: Option<&str>, msg: &str) -> DbError {
    let field = constraint
        .map(str::to_string)
        .or_else(|| {
            msg.split("UNIQUE constraint failed: ")
                .nth(1)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    DbError::UniqueViolation {
        field,
        value: "unknown".to_string(),
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

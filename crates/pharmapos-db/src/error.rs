//! # Database Errors
//!
//! ```text
//! sqlx::Error ─────────┐
//! MigrateError ────────┼──► DbError ──► ApiError (status + JSON body)
//! CoreError ── Rule ───┘
//!   (stock guard or coupon check failing inside a checkout transaction)
//! ```
//!
//! Constraint failures are classified by SQLite's error kind, so the
//! repositories can turn a UNIQUE failure on `products.sku` into
//! "Duplicate sku: 'A-1' already exists" without string matching at the
//! call site.

use pharmapos_core::CoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write: SKU, barcode, username or coupon
    /// code. `field` is the bare column name.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule rejected the write; any open transaction was rolled
    /// back.
    #[error(transparent)]
    Rule(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A JSON column (discount rules, suspended cart lines) no longer
    /// decodes into its type.
    #[error("Corrupt {column} column: {reason}")]
    CorruptColumn { column: String, reason: String },

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub(crate) fn corrupt(column: &str, err: serde_json::Error) -> Self {
        DbError::CorruptColumn {
            column: column.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Column named in "UNIQUE constraint failed: products.sku" (first one
/// for composite indexes).
fn unique_column(message: &str) -> &str {
    message
        .split_once("failed: ")
        .map(|(_, cols)| cols)
        .and_then(|cols| cols.split(',').next())
        .map(|col| col.trim())
        .map(|col| col.rsplit_once('.').map_or(col, |(_, name)| name))
        .unwrap_or("unknown")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    DbError::duplicate(unique_column(db_err.message()), "unknown")
                }
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

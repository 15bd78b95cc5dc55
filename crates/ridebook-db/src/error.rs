//! # Database Error Types
//!
//! ```text
//! sqlx::Error ──► DbError ──► StoreError (port) ──► EngineError / ApiError
//! ```
//!
//! SQLite constraint failures are classified by `sqlx`'s `ErrorKind`. The
//! immutability trigger raises a plain `ABORT`, recognised by its message.

use ridebook_core::StoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Prefix of the message raised by `trg_bookings_immutable`.
const IMMUTABLE_FIELD: &str = "immutable";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A status compare-and-set matched no row although the record exists.
    #[error("{entity} {id} changed concurrently")]
    StaleStatus { entity: &'static str, id: String },

    /// `field` is the `table.column` SQLite names, when it names one.
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    /// A CHECK, NOT NULL or foreign key constraint, or the immutability
    /// trigger, rejected the write.
    ///
    /// ## When This Occurs
    /// - Unknown status / vehicle class / role text
    /// - Negative fare, blank location
    /// - UPDATE touching fare, owner_id or created_at
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Every connection is busy and the acquire timeout elapsed.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Query failed: {0}")]
    Query(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn stale(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::StaleStatus {
            entity,
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                    },
                    ErrorKind::CheckViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::ForeignKeyViolation => DbError::ConstraintViolation { message },
                    _ if message.starts_with(IMMUTABLE_FIELD) => {
                        DbError::ConstraintViolation { message }
                    }
                    _ => DbError::Query(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// ```text
/// NotFound         → StoreError::NotFound
/// StaleStatus      → StoreError::Conflict
/// UniqueViolation  → StoreError::Duplicate
/// everything else  → StoreError::Unavailable
/// ```
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => StoreError::NotFound,
            DbError::StaleStatus { id, .. } => StoreError::Conflict { id },
            DbError::UniqueViolation { field } => StoreError::Duplicate(field),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

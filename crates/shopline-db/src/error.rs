//! Storage-layer errors.
//!
//! ```text
//! sqlx::Error ──┐
//!               ├──► DbError ──► ApiError (pos-api: status + {code, message})
//! CoreError ────┘
//! ```
//!
//! SQLite busy/locked results become [`DbError::Conflict`], so a sale that
//! loses the race for the write lock is reported like a stale version.

use shopline_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row (second account with the same email
    /// or phone, second shop row for the same stock).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A referenced shop, stock or user is missing, or a restricted parent
    /// (a user who still owns shops) was deleted.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The store refused the write because another transaction holds or
    /// changed the data (SQLITE_BUSY, SQLITE_LOCKED, stale snapshot).
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    /// A business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure, including CHECK and trigger aborts.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for errors a client may resolve by reloading and retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::Conflict(_) | DbError::Domain(CoreError::ConcurrencyConflict { .. })
        )
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// SQLite primary and extended result codes that mean "someone else got
/// there first": BUSY (5), LOCKED (6), BUSY_RECOVERY (261),
/// LOCKED_SHAREDCACHE (262), BUSY_SNAPSHOT (517).
const CONFLICT_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Column list from "UNIQUE constraint failed: users.email".
fn unique_columns(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, columns)| columns.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // Repositories name the entity themselves; this is the fallback.
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let busy = db_err
                    .code()
                    .as_deref()
                    .is_some_and(|code| CONFLICT_CODES.contains(&code));

                if busy || message.contains("database is locked") {
                    return DbError::Conflict(message);
                }

                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        DbError::duplicate(unique_columns(&message), "unknown")
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_becomes_domain_error() {
        let err: DbError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[test]
    fn test_conflict_detection() {
        assert!(DbError::Conflict("database is locked".to_string()).is_conflict());
        assert!(DbError::Domain(CoreError::conflict("ShopStock", 3)).is_conflict());
        assert!(!DbError::not_found("Shop", 3).is_conflict());
    }

    #[test]
    fn test_unique_columns_from_message() {
        assert_eq!(
            unique_columns("UNIQUE constraint failed: users.email"),
            "users.email"
        );
        assert_eq!(unique_columns("constraint"), "unknown");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err = DbError::Domain(CoreError::EmptyCart);
        assert_eq!(err.to_string(), "Cart is empty");
    }
}

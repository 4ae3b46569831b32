//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Input rejected before reaching the store
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl DatabaseError {
    /// Map an insert failure, turning unique violations into `AlreadyExists`.
    pub(crate) fn on_insert(err: sqlx::Error, entity: &'static str, id: impl Into<String>) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity,
                    id: id.into(),
                };
            }
        }
        DatabaseError::Sqlx(err)
    }

    /// Whether SQLite refused the write because another writer holds the lock.
    ///
    /// Covers `SQLITE_BUSY`, `SQLITE_LOCKED` and their extended codes.
    pub fn is_conflict(&self) -> bool {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db_err)) => matches!(
                db_err.code().as_deref(),
                Some("5" | "6" | "261" | "262" | "517")
            ),
            _ => false,
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

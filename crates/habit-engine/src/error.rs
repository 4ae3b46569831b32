//! Error types for engine operations.

use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors that can occur while recording or reporting habit activity.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The record does not exist or is not owned by the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected before any mutation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A record with the same unique key already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// A concurrent mutation of the same habit won the race.
    #[error("conflicting update: {0}")]
    Conflict(String),

    /// Feed publishing failed.
    #[error("feed error: {0}")]
    Feed(String),

    /// Any other storage failure.
    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl EngineError {
    /// Whether retrying the whole operation may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }
}

impl From<DatabaseError> for EngineError {
    fn from(err: DatabaseError) -> Self {
        if err.is_conflict() {
            return EngineError::Conflict(err.to_string());
        }
        match err {
            DatabaseError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DatabaseError::Validation(e) => EngineError::Validation(e),
            // Two writers inserting the same day's entry.
            DatabaseError::AlreadyExists {
                entity: "HabitEntry",
                id,
            } => EngineError::Conflict(format!("entry {} was created concurrently", id)),
            DatabaseError::AlreadyExists { entity, id } => EngineError::AlreadyExists { entity, id },
            other => EngineError::Database(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

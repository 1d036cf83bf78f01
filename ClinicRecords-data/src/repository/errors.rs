use std::sync::PoisonError;

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A row broke a table constraint (unknown parameter type, inverted threshold)
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// In-memory tables poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),

    /// Row missing right after it was written
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Constraint(message.clone().unwrap_or_else(|| failure.to_string()))
            }
            other => RepositoryError::Sqlite(other),
        }
    }
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

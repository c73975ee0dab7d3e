//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DatabaseError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("row".to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                if message.contains("UNIQUE constraint failed") {
                    DatabaseError::Duplicate(message)
                } else if message.contains("CHECK constraint failed")
                    || message.contains("FOREIGN KEY constraint failed")
                {
                    DatabaseError::ValidationError(message)
                } else {
                    DatabaseError::QueryError(message)
                }
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

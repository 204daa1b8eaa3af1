//! Error types for the persistence layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("database migration failed: {0}")]
    Migration(String),

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Query(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DatabaseError>;

//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

impl DbError {
    /// Whether this error reports a uniqueness violation
    pub fn is_duplicate(&self) -> bool {
        match self {
            DbError::Duplicate(_) => true,
            DbError::Connection(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

//! Database-specific error types and conversions.

use pluma_core::error::PlumaError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for PlumaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PlumaError::NotFound { entity, id },
            other => PlumaError::Database(other.to_string()),
        }
    }
}

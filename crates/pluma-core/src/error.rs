//! Error types for the Pluma system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlumaError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Entity already exists: {entity}")]
    Conflict { entity: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlumaError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        PlumaError::Validation {
            message: message.into(),
        }
    }
}

pub type PlumaResult<T> = Result<T, PlumaError>;

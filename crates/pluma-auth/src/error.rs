//! Authentication error types.

use pluma_core::error::PlumaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("reset token is expired or invalid")]
    ResetTokenExpiredOrInvalid,

    #[error("invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("administrator role required")]
    RoleRequired,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for PlumaError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Crypto(msg) => PlumaError::Internal(msg),
            other => PlumaError::Auth {
                reason: other.to_string(),
            },
        }
    }
}

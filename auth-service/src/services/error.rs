use service_core::error::AppError;
use thiserror::Error;

/// Failure taxonomy for the authentication core. Variants are deliberately
/// precise: clients and security logs must be able to tell a malformed token
/// from an expired or revoked one.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login failure. Never reveals whether the email exists.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Well-formed, correctly signed token past its expiry.
    #[error("Token expired")]
    Expired,

    /// Malformed, unsigned or wrong-algorithm token.
    #[error("Invalid token")]
    Invalid,

    /// Token explicitly revoked or covered by a subject watermark.
    #[error("Token revoked")]
    Revoked,

    /// Refresh token reuse. The presenting subject's whole token family has
    /// already been revoked by the time this is returned.
    #[error("Refresh token replay detected")]
    ReplayDetected,

    /// Backing store failure or timeout. Always fail closed.
    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("User not found")]
    UserNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            AuthError::Expired => AppError::AuthError(anyhow::anyhow!("Token expired")),
            AuthError::Invalid => AppError::AuthError(anyhow::anyhow!("Invalid token")),
            AuthError::Revoked => AppError::AuthError(anyhow::anyhow!("Token revoked")),
            AuthError::ReplayDetected => {
                AppError::AuthError(anyhow::anyhow!("Refresh token replay detected"))
            }
            AuthError::ServiceUnavailable => AppError::ServiceUnavailable,
            AuthError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            AuthError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            AuthError::Forbidden => AppError::Forbidden(anyhow::anyhow!("Forbidden")),
            AuthError::Internal(e) => AppError::InternalError(e),
        }
    }
}

use auth::AccountStateError;
use auth::JwtError;
use thiserror::Error;

use crate::domain::shadow::errors::ShadowStoreError;

/// Errors returned by login, refresh and verify.
///
/// Credential failures never say which half was wrong. Token failures always
/// say whether the token expired.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    AccountState(#[from] AccountStateError),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::Malformed(_) | JwtError::WrongKind { .. } => AuthError::InvalidToken,
            JwtError::KeyLoad(_)
            | JwtError::UnsupportedAlgorithm(_)
            | JwtError::SigningUnavailable
            | JwtError::EncodingFailed(_) => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<ShadowStoreError> for AuthError {
    fn from(err: ShadowStoreError) -> Self {
        AuthError::Unavailable(err.to_string())
    }
}

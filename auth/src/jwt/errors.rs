use thiserror::Error;

use super::claims::TokenKind;

/// Error type for token operations.
///
/// `Expired` and `Malformed` are the only verification outcomes callers need to
/// tell apart: an expired token can be replaced through refresh, anything else
/// is rejected outright.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to load key material: {0}")]
    KeyLoad(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("This codec holds no signing key")]
    SigningUnavailable,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Expected {expected} token, got {found} token")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

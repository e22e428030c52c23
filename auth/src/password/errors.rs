use thiserror::Error;

/// Error type for credential hashing operations.
///
/// Messages never include the secret or the stored hash.
#[derive(Debug, Clone, Error)]
pub enum HashError {
    #[error("Credential hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored credential hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParameters(String),
}

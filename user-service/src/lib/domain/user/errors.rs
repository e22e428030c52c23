use thiserror::Error;

/// Error for FullName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FullNameError {
    #[error("Full name must not be empty")]
    Empty,

    #[error("Full name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

/// Error for event publishing operations
#[derive(Debug, Clone, Error)]
pub enum EventPublisherError {
    #[error("Failed to serialize event: {0}")]
    SerializationFailed(String),

    #[error("Failed to publish event to broker: {0}")]
    PublishFailed(String),
}

/// Top-level error for all user-related operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid full name: {0}")]
    InvalidFullName(#[from] FullNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    // Domain-level errors
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("New email is the same as the current one")]
    EmailUnchanged,

    #[error("Admin accounts cannot be self-registered")]
    AdminRegistration,

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        UserError::Unknown(err.to_string())
    }
}

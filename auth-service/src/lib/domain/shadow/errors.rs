use thiserror::Error;
use user_facts::ProjectionError;
use user_facts::UserId;

/// Errors raised by shadow user storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShadowStoreError {
    /// A non-`Created` fact arrived for a user with no record.
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    /// The write collided with another one; retrying may succeed.
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Shadow store unavailable: {0}")]
    Unavailable(String),

    /// A stored row cannot be read back into a shadow user.
    #[error("Corrupt shadow record: {0}")]
    Corrupt(String),
}

impl From<ProjectionError> for ShadowStoreError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::UnknownUser(id) => ShadowStoreError::UnknownUser(id),
            ProjectionError::UserMismatch { .. } => ShadowStoreError::Corrupt(err.to_string()),
        }
    }
}

use async_trait::async_trait;
use user_facts::UserFact;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::Password;
use crate::domain::user::models::UpdateStatusCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChange;
use crate::domain::user::models::UserId;
use crate::user::errors::EventPublisherError;
use crate::user::errors::UserError;

/// Port for user domain service operations.
///
/// Every successful mutation publishes one fact after the write commits.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Create new user with validated credentials.
    ///
    /// New users are active and unverified.
    ///
    /// # Errors
    /// * `AdminRegistration` - Admin role requested
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;

    /// Replace the user's full name.
    async fn rename(&self, id: &UserId, full_name: FullName) -> Result<User, UserError>;

    /// Move the user to a new email address.
    ///
    /// # Errors
    /// * `EmailUnchanged` - New address equals the current one
    /// * `EmailAlreadyExists` - Address belongs to another user
    async fn change_email(&self, id: &UserId, email: EmailAddress) -> Result<User, UserError>;

    /// Hash and store a new password.
    async fn change_password(&self, id: &UserId, password: Password) -> Result<User, UserError>;

    /// Change role and activity or verification flags.
    async fn update_status(
        &self,
        id: &UserId,
        command: UpdateStatusCommand,
    ) -> Result<User, UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Returns
    /// Stored user with the commit timestamp as `created_at` and `updated_at`
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Write one change to an existing user, atomically per row.
    ///
    /// # Returns
    /// Stored user after the change; `updated_at` is the commit timestamp,
    /// strictly later than the previous one
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn apply(&self, id: &UserId, change: UserChange) -> Result<User, UserError>;
}

/// Publication of user facts.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Publish one fact under its routing key, keyed by user id.
    ///
    /// # Errors
    /// * `SerializationFailed` - Fact could not be encoded
    /// * `PublishFailed` - Broker did not acknowledge the message
    async fn publish(&self, fact: &UserFact) -> Result<(), EventPublisherError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use auth::CredentialVerifier;
use auth::Role;
use chrono::Utc;
use user_facts::FactKind;

use crate::domain::user::events::user_fact;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::Password;
use crate::domain::user::models::UpdateStatusCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserChange;
use crate::domain::user::models::UserId;
use crate::user::errors::PasswordError;
use crate::user::errors::UserError;
use crate::user::ports::EventPublisher;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR, EP>
where
    UR: UserRepository,
    EP: EventPublisher,
{
    repository: Arc<UR>,
    event_publisher: Arc<EP>,
    password_hasher: CredentialVerifier,
}

impl<UR, EP> UserService<UR, EP>
where
    UR: UserRepository,
    EP: EventPublisher,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `event_publisher` - Fact publishing implementation
    /// * `password_hasher` - Argon2 hasher for new credentials
    pub fn new(
        repository: Arc<UR>,
        event_publisher: Arc<EP>,
        password_hasher: CredentialVerifier,
    ) -> Self {
        Self {
            repository,
            event_publisher,
            password_hasher,
        }
    }

    async fn find(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    fn hash(&self, password: &Password) -> Result<String, UserError> {
        self.password_hasher
            .hash(password.expose())
            .map_err(|e| UserError::Password(PasswordError::HashingFailed(e.to_string())))
    }

    /// Publish after commit; the local write stands even if the broker is down.
    async fn publish(&self, user: &User, kind: FactKind) {
        let fact = user_fact(user, kind);
        if let Err(e) = self.event_publisher.publish(&fact).await {
            tracing::error!(
                user_id = %user.id,
                routing_key = kind.routing_key(),
                "Failed to publish user fact: {}",
                e
            );
        }
    }
}

#[async_trait]
impl<UR, EP> UserServicePort for UserService<UR, EP>
where
    UR: UserRepository,
    EP: EventPublisher,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        if command.role == Role::Admin {
            return Err(UserError::AdminRegistration);
        }

        let password_hash = self.hash(&command.password)?;
        let now = Utc::now();

        let user = User {
            id: UserId::new(),
            email: command.email,
            full_name: command.full_name,
            password_hash,
            role: command.role,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, role = %created_user.role, "User created");

        self.publish(&created_user, FactKind::Created).await;
        Ok(created_user)
    }

    async fn rename(&self, id: &UserId, full_name: FullName) -> Result<User, UserError> {
        let updated_user = self
            .repository
            .apply(id, UserChange::FullName(full_name))
            .await?;
        self.publish(&updated_user, FactKind::FullNameChanged).await;
        Ok(updated_user)
    }

    async fn change_email(&self, id: &UserId, email: EmailAddress) -> Result<User, UserError> {
        let user = self.find(id).await?;
        if user.email == email {
            return Err(UserError::EmailUnchanged);
        }

        let updated_user = self.repository.apply(id, UserChange::Email(email)).await?;
        self.publish(&updated_user, FactKind::EmailChanged).await;
        Ok(updated_user)
    }

    async fn change_password(&self, id: &UserId, password: Password) -> Result<User, UserError> {
        let password_hash = self.hash(&password)?;

        let updated_user = self
            .repository
            .apply(id, UserChange::PasswordHash(password_hash))
            .await?;
        self.publish(&updated_user, FactKind::PasswordChanged).await;
        Ok(updated_user)
    }

    async fn update_status(
        &self,
        id: &UserId,
        command: UpdateStatusCommand,
    ) -> Result<User, UserError> {
        let updated_user = self
            .repository
            .apply(id, UserChange::Status(command))
            .await?;
        tracing::info!(
            user_id = %updated_user.id,
            role = %updated_user.role,
            is_active = updated_user.is_active,
            is_verified = updated_user.is_verified,
            "User standing changed"
        );

        self.publish(&updated_user, FactKind::StatusChanged).await;
        Ok(updated_user)
    }
}

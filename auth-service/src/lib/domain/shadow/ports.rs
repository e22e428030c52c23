use async_trait::async_trait;
use user_facts::ApplyOutcome;
use user_facts::ShadowUser;
use user_facts::UserFact;
use user_facts::UserId;

use super::errors::ShadowStoreError;

/// Port for the local shadow copy of users.
///
/// Facts are the only way in: `upsert_if_newer` is the single mutation.
#[async_trait]
pub trait ShadowUserRepository: Send + Sync + 'static {
    /// Fold a fact into the stored record of its user.
    ///
    /// Must be atomic per user: two concurrent calls for the same user behave
    /// as if applied one after the other. Calls for different users do not
    /// block each other.
    ///
    /// # Returns
    /// `Applied` if any field changed, `Skipped` with the reason otherwise
    ///
    /// # Errors
    /// * `UnknownUser` - Non-`Created` fact for a user with no record
    /// * `Conflict` - Lost a race with another write, retry later
    /// * `Unavailable` - Storage cannot be reached
    async fn upsert_if_newer(&self, fact: &UserFact) -> Result<ApplyOutcome, ShadowStoreError>;

    /// Get a user by email.
    ///
    /// # Returns
    /// User if found, None if not found
    async fn find_by_email(&self, email: &str) -> Result<Option<ShadowUser>, ShadowStoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<ShadowUser>, ShadowStoreError>;
}

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use user_facts::project;
use user_facts::ApplyOutcome;
use user_facts::ShadowUser;
use user_facts::UserFact;
use user_facts::UserId;

use crate::domain::shadow::errors::ShadowStoreError;
use crate::domain::shadow::ports::ShadowUserRepository;

/// In-process shadow store.
///
/// Serializes all writes behind one lock. Used for tests and local runs without
/// a database.
#[derive(Default)]
pub struct InMemoryShadowUserRepository {
    users: RwLock<HashMap<UserId, ShadowUser>>,
}

impl InMemoryShadowUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl ShadowUserRepository for InMemoryShadowUserRepository {
    async fn upsert_if_newer(&self, fact: &UserFact) -> Result<ApplyOutcome, ShadowStoreError> {
        let mut users = self.users.write().await;

        let current = users.get(&fact.user_id).cloned();
        let (user, outcome) = project(current, fact)?;

        if outcome == ApplyOutcome::Applied {
            let email_taken = users
                .values()
                .any(|other| other.id != user.id && other.email == user.email);
            if email_taken {
                return Err(ShadowStoreError::Conflict(format!(
                    "Email {} belongs to another user",
                    user.email
                )));
            }
            users.insert(user.id, user);
        }

        Ok(outcome)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ShadowUser>, ShadowStoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<ShadowUser>, ShadowStoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

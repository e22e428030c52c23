use std::sync::Arc;
use std::time::Duration;

use user_facts::messages;
use user_facts::ApplyOutcome;
use user_facts::FactError;
use user_facts::UserFact;

use super::errors::ShadowStoreError;
use super::models::MessageOutcome;
use super::ports::ShadowUserRepository;

/// Applies delivered user facts to the shadow store.
///
/// Broker agnostic: adapters hand over the routing key and raw body and act on
/// the returned outcome's disposition.
pub struct Reconciler<R>
where
    R: ShadowUserRepository,
{
    repository: Arc<R>,
    apply_timeout: Duration,
}

impl<R> Reconciler<R>
where
    R: ShadowUserRepository,
{
    /// # Arguments
    /// * `repository` - Shadow user storage
    /// * `apply_timeout` - Upper bound for one store write
    pub fn new(repository: Arc<R>, apply_timeout: Duration) -> Self {
        Self {
            repository,
            apply_timeout,
        }
    }

    /// Decode and apply one message received on `routing_key`.
    pub async fn handle(&self, routing_key: &str, payload: Option<&[u8]>) -> MessageOutcome {
        let fact = match payload
            .ok_or(FactError::MissingField("payload"))
            .and_then(|body| messages::decode_routed(routing_key, body))
        {
            Ok(fact) => fact,
            Err(error) => {
                tracing::warn!(
                    routing_key = routing_key,
                    error = %error,
                    "Rejecting unparseable user fact"
                );
                return MessageOutcome::ParseFailed(error);
            }
        };

        self.apply(&fact).await
    }

    /// Apply a decoded fact within the apply timeout.
    pub async fn apply(&self, fact: &UserFact) -> MessageOutcome {
        let result =
            tokio::time::timeout(self.apply_timeout, self.repository.upsert_if_newer(fact)).await;

        let outcome = match result {
            Err(_) => MessageOutcome::TimedOut,
            Ok(Ok(ApplyOutcome::Applied)) => MessageOutcome::Applied {
                user_id: fact.user_id,
                kind: fact.kind(),
            },
            Ok(Ok(ApplyOutcome::Skipped(reason))) => MessageOutcome::Skipped {
                user_id: fact.user_id,
                reason,
            },
            Ok(Err(ShadowStoreError::UnknownUser(user_id))) => MessageOutcome::UnknownUser(user_id),
            Ok(Err(ShadowStoreError::Corrupt(detail))) => MessageOutcome::Corrupt(detail),
            Ok(Err(error)) => MessageOutcome::ApplyFailed(error.to_string()),
        };

        log_outcome(fact, &outcome);
        outcome
    }
}

fn log_outcome(fact: &UserFact, outcome: &MessageOutcome) {
    match outcome {
        MessageOutcome::Applied { .. } => tracing::info!(
            user_id = %fact.user_id,
            fact_type = %fact.kind(),
            occurred_at = %fact.occurred_at,
            "User fact applied to shadow store"
        ),
        MessageOutcome::Skipped { reason, .. } => tracing::debug!(
            user_id = %fact.user_id,
            fact_type = %fact.kind(),
            occurred_at = %fact.occurred_at,
            reason = ?reason,
            "User fact skipped"
        ),
        MessageOutcome::UnknownUser(_) => tracing::warn!(
            user_id = %fact.user_id,
            fact_type = %fact.kind(),
            "User fact for unknown user rejected"
        ),
        MessageOutcome::Corrupt(detail) => tracing::error!(
            user_id = %fact.user_id,
            fact_type = %fact.kind(),
            detail = %detail,
            "Shadow record is corrupt; rejecting user fact"
        ),
        MessageOutcome::ApplyFailed(error) => tracing::error!(
            user_id = %fact.user_id,
            fact_type = %fact.kind(),
            error = %error,
            "Failed to apply user fact"
        ),
        MessageOutcome::TimedOut => tracing::error!(
            user_id = %fact.user_id,
            fact_type = %fact.kind(),
            "Applying user fact timed out"
        ),
        MessageOutcome::ParseFailed(_) => {}
    }
}

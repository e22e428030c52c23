//! Wire types for user facts.
//!
//! JSON bodies tagged by `fact_type`, kept apart from the domain types and
//! checked once at the boundary.
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::FactError;
use crate::fact::FactChange;
use crate::fact::FactKind;
use crate::fact::Standing;
use crate::fact::UserFact;
use crate::fact::UserId;

/// Serializable envelope for all user facts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "fact_type", rename_all = "snake_case")]
pub enum UserFactMessage {
    Created(CredentialFactBody),
    FullNameChanged(FactBody),
    EmailChanged(FactBody),
    PasswordChanged(CredentialFactBody),
    StatusChanged(FactBody),
}

/// Body shared by facts that do not concern the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactBody {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Body of facts that ship the PHC password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialFactBody {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub password_hash: String,
    pub occurred_at: DateTime<Utc>,
}

impl UserFactMessage {
    pub fn kind(&self) -> FactKind {
        match self {
            UserFactMessage::Created(_) => FactKind::Created,
            UserFactMessage::FullNameChanged(_) => FactKind::FullNameChanged,
            UserFactMessage::EmailChanged(_) => FactKind::EmailChanged,
            UserFactMessage::PasswordChanged(_) => FactKind::PasswordChanged,
            UserFactMessage::StatusChanged(_) => FactKind::StatusChanged,
        }
    }
}

impl From<&UserFact> for UserFactMessage {
    fn from(fact: &UserFact) -> Self {
        let body = || FactBody {
            user_id: fact.user_id.to_string(),
            email: fact.email.clone(),
            full_name: fact.full_name.clone(),
            role: fact.standing.role,
            is_active: fact.standing.is_active,
            is_verified: fact.standing.is_verified,
            occurred_at: fact.occurred_at,
        };
        let credential_body = |password_hash: &str| CredentialFactBody {
            user_id: fact.user_id.to_string(),
            email: fact.email.clone(),
            full_name: fact.full_name.clone(),
            role: fact.standing.role,
            is_active: fact.standing.is_active,
            is_verified: fact.standing.is_verified,
            password_hash: password_hash.to_string(),
            occurred_at: fact.occurred_at,
        };

        match &fact.change {
            FactChange::Created { password_hash } => {
                UserFactMessage::Created(credential_body(password_hash))
            }
            FactChange::FullNameChanged => UserFactMessage::FullNameChanged(body()),
            FactChange::EmailChanged => UserFactMessage::EmailChanged(body()),
            FactChange::PasswordChanged { password_hash } => {
                UserFactMessage::PasswordChanged(credential_body(password_hash))
            }
            FactChange::StatusChanged => UserFactMessage::StatusChanged(body()),
        }
    }
}

impl TryFrom<UserFactMessage> for UserFact {
    type Error = FactError;

    fn try_from(message: UserFactMessage) -> Result<Self, Self::Error> {
        match message {
            UserFactMessage::Created(m) => {
                let password_hash = required_hash(m.password_hash)?;
                into_fact(
                    &m.user_id,
                    m.email,
                    m.full_name,
                    m.role,
                    m.is_active,
                    m.is_verified,
                    m.occurred_at,
                    FactChange::Created { password_hash },
                )
            }
            UserFactMessage::PasswordChanged(m) => {
                let password_hash = required_hash(m.password_hash)?;
                into_fact(
                    &m.user_id,
                    m.email,
                    m.full_name,
                    m.role,
                    m.is_active,
                    m.is_verified,
                    m.occurred_at,
                    FactChange::PasswordChanged { password_hash },
                )
            }
            UserFactMessage::FullNameChanged(m) => from_body(m, FactChange::FullNameChanged),
            UserFactMessage::EmailChanged(m) => from_body(m, FactChange::EmailChanged),
            UserFactMessage::StatusChanged(m) => from_body(m, FactChange::StatusChanged),
        }
    }
}

fn required_hash(password_hash: String) -> Result<String, FactError> {
    if password_hash.is_empty() {
        return Err(FactError::MissingField("password_hash"));
    }
    Ok(password_hash)
}

fn from_body(m: FactBody, change: FactChange) -> Result<UserFact, FactError> {
    into_fact(
        &m.user_id,
        m.email,
        m.full_name,
        m.role,
        m.is_active,
        m.is_verified,
        m.occurred_at,
        change,
    )
}

#[allow(clippy::too_many_arguments)]
fn into_fact(
    user_id: &str,
    email: String,
    full_name: String,
    role: Role,
    is_active: bool,
    is_verified: bool,
    occurred_at: DateTime<Utc>,
    change: FactChange,
) -> Result<UserFact, FactError> {
    if email.is_empty() {
        return Err(FactError::MissingField("email"));
    }

    Ok(UserFact {
        user_id: UserId::from_string(user_id)?,
        occurred_at,
        email,
        full_name,
        standing: Standing {
            role,
            is_active,
            is_verified,
        },
        change,
    })
}

/// Serialize a fact to its canonical JSON body.
pub fn encode(fact: &UserFact) -> Result<Vec<u8>, FactError> {
    serde_json::to_vec(&UserFactMessage::from(fact)).map_err(|e| FactError::Encode(e.to_string()))
}

/// Decode a JSON body into a fact.
///
/// # Errors
/// * `Decode` - Not UTF-8 JSON, unknown `fact_type`, missing or mistyped field
/// * `MissingField` - Required field present but empty
/// * `InvalidUserId` - `user_id` is not a UUID
pub fn decode(payload: &[u8]) -> Result<UserFact, FactError> {
    let message: UserFactMessage =
        serde_json::from_slice(payload).map_err(|e| FactError::Decode(e.to_string()))?;
    UserFact::try_from(message)
}

/// Decode a body received on `routing_key` and check it belongs there.
///
/// # Errors
/// * `UnknownRoutingKey` - No fact kind is published on this key
/// * `KindMismatch` - The body's `fact_type` belongs to another routing key
/// * Every error of [`decode`]
pub fn decode_routed(routing_key: &str, payload: &[u8]) -> Result<UserFact, FactError> {
    let expected = FactKind::from_routing_key(routing_key)
        .ok_or_else(|| FactError::UnknownRoutingKey(routing_key.to_string()))?;

    let fact = decode(payload)?;

    if fact.kind() != expected {
        return Err(FactError::KindMismatch {
            routing_key: routing_key.to_string(),
            fact_type: fact.kind().as_str(),
        });
    }

    Ok(fact)
}

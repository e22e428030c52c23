use std::fmt;

use auth::AccountStatus;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::FactError;

/// User unique identifier value object.
///
/// Shared by the owning service and every projection of its users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        UserId(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidUserId` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, FactError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| FactError::InvalidUserId(e.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role and status flags of a user as of a fact's commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
}

impl Standing {
    pub fn status(&self) -> AccountStatus {
        AccountStatus::new(self.is_active, self.is_verified)
    }
}

/// Kind of lifecycle fact, one per routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    Created,
    FullNameChanged,
    EmailChanged,
    PasswordChanged,
    StatusChanged,
}

impl FactKind {
    pub const ALL: [FactKind; 5] = [
        FactKind::Created,
        FactKind::FullNameChanged,
        FactKind::EmailChanged,
        FactKind::PasswordChanged,
        FactKind::StatusChanged,
    ];

    pub fn routing_key(&self) -> &'static str {
        match self {
            FactKind::Created => "user.created",
            FactKind::FullNameChanged => "user.fullname.updated",
            FactKind::EmailChanged => "user.email.updated",
            FactKind::PasswordChanged => "user.password.updated",
            FactKind::StatusChanged => "user.status.updated",
        }
    }

    pub fn from_routing_key(routing_key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.routing_key() == routing_key)
    }

    /// Value of the `fact_type` tag on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Created => "created",
            FactKind::FullNameChanged => "full_name_changed",
            FactKind::EmailChanged => "email_changed",
            FactKind::PasswordChanged => "password_changed",
            FactKind::StatusChanged => "status_changed",
        }
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened, with the data only some kinds carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactChange {
    Created { password_hash: String },
    FullNameChanged,
    EmailChanged,
    PasswordChanged { password_hash: String },
    StatusChanged,
}

/// Immutable record of a committed change to a user.
///
/// Carries the complete resulting values (never a delta) so it can be replayed
/// any number of times. `occurred_at` is the owning store's commit timestamp and
/// orders facts of the same user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFact {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
    pub email: String,
    pub full_name: String,
    pub standing: Standing,
    pub change: FactChange,
}

impl UserFact {
    pub fn kind(&self) -> FactKind {
        match self.change {
            FactChange::Created { .. } => FactKind::Created,
            FactChange::FullNameChanged => FactKind::FullNameChanged,
            FactChange::EmailChanged => FactKind::EmailChanged,
            FactChange::PasswordChanged { .. } => FactKind::PasswordChanged,
            FactChange::StatusChanged => FactKind::StatusChanged,
        }
    }

    pub fn routing_key(&self) -> &'static str {
        self.kind().routing_key()
    }

    pub fn password_hash(&self) -> Option<&str> {
        match &self.change {
            FactChange::Created { password_hash } | FactChange::PasswordChanged { password_hash } => {
                Some(password_hash)
            }
            _ => None,
        }
    }
}

use auth::AccountStatus;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

use crate::fact::FactKind;
use crate::fact::UserFact;
use crate::fact::UserId;

/// Independently versioned groups of shadow fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    FullName,
    Email,
    Password,
    /// Role, activity and verification flags
    Standing,
}

impl FactKind {
    /// Field groups whose complete value a fact of this kind carries.
    ///
    /// Every fact reports the standing as of its commit.
    pub fn field_groups(&self) -> &'static [FieldGroup] {
        match self {
            FactKind::Created => &[
                FieldGroup::FullName,
                FieldGroup::Email,
                FieldGroup::Password,
                FieldGroup::Standing,
            ],
            FactKind::FullNameChanged => &[FieldGroup::FullName, FieldGroup::Standing],
            FactKind::EmailChanged => &[FieldGroup::Email, FieldGroup::Standing],
            FactKind::PasswordChanged => &[FieldGroup::Password, FieldGroup::Standing],
            FactKind::StatusChanged => &[FieldGroup::Standing],
        }
    }
}

/// Commit timestamp of the fact each field group was last written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldVersions {
    pub full_name_at: DateTime<Utc>,
    pub email_at: DateTime<Utc>,
    pub password_at: DateTime<Utc>,
    pub standing_at: DateTime<Utc>,
}

impl FieldVersions {
    pub fn all(at: DateTime<Utc>) -> Self {
        Self {
            full_name_at: at,
            email_at: at,
            password_at: at,
            standing_at: at,
        }
    }

    pub fn get(&self, group: FieldGroup) -> DateTime<Utc> {
        match group {
            FieldGroup::FullName => self.full_name_at,
            FieldGroup::Email => self.email_at,
            FieldGroup::Password => self.password_at,
            FieldGroup::Standing => self.standing_at,
        }
    }

    fn set(&mut self, group: FieldGroup, at: DateTime<Utc>) {
        match group {
            FieldGroup::FullName => self.full_name_at = at,
            FieldGroup::Email => self.email_at = at,
            FieldGroup::Password => self.password_at = at,
            FieldGroup::Standing => self.standing_at = at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A newer fact already wrote every field group this fact concerns.
    Stale,
    /// The fact's values are already recorded.
    DuplicateNoChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("No shadow record for user {0}")]
    UnknownUser(UserId),

    #[error("Fact for user {fact} cannot be applied to user {record}")]
    UserMismatch { fact: UserId, record: UserId },
}

/// Local projection of a user kept by services that do not own user records.
///
/// Mutated only by applying facts. A field group is overwritten only by a fact
/// strictly newer than the one it was last written from, so applying facts is
/// idempotent and independent of delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowUser {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    /// Newest commit timestamp applied to any field group; never decreases.
    pub last_applied_occurred_at: DateTime<Utc>,
    pub versions: FieldVersions,
}

impl ShadowUser {
    /// Build the initial record from a `Created` fact.
    ///
    /// Returns `None` for every other kind of fact.
    pub fn from_created(fact: &UserFact) -> Option<Self> {
        if fact.kind() != FactKind::Created {
            return None;
        }
        let password_hash = fact.password_hash()?;

        Some(Self {
            id: fact.user_id,
            email: fact.email.clone(),
            full_name: fact.full_name.clone(),
            password_hash: password_hash.to_string(),
            role: fact.standing.role,
            is_active: fact.standing.is_active,
            is_verified: fact.standing.is_verified,
            last_applied_occurred_at: fact.occurred_at,
            versions: FieldVersions::all(fact.occurred_at),
        })
    }

    pub fn status(&self) -> AccountStatus {
        AccountStatus::new(self.is_active, self.is_verified)
    }

    /// Apply a fact of the same user.
    ///
    /// # Errors
    /// * `UserMismatch` - Fact belongs to another user
    pub fn apply(&mut self, fact: &UserFact) -> Result<ApplyOutcome, ProjectionError> {
        if fact.user_id != self.id {
            return Err(ProjectionError::UserMismatch {
                fact: fact.user_id,
                record: self.id,
            });
        }

        let at = fact.occurred_at;
        let mut applied = false;

        for group in fact.kind().field_groups() {
            if at > self.versions.get(*group) {
                self.write(*group, fact);
                self.versions.set(*group, at);
                applied = true;
            }
        }

        if applied {
            self.last_applied_occurred_at = self.last_applied_occurred_at.max(at);
            return Ok(ApplyOutcome::Applied);
        }

        if self.holds_values_of(fact) {
            Ok(ApplyOutcome::Skipped(SkipReason::DuplicateNoChange))
        } else {
            Ok(ApplyOutcome::Skipped(SkipReason::Stale))
        }
    }

    fn write(&mut self, group: FieldGroup, fact: &UserFact) {
        match group {
            FieldGroup::FullName => self.full_name = fact.full_name.clone(),
            FieldGroup::Email => self.email = fact.email.clone(),
            FieldGroup::Password => {
                if let Some(password_hash) = fact.password_hash() {
                    self.password_hash = password_hash.to_string();
                }
            }
            FieldGroup::Standing => {
                self.role = fact.standing.role;
                self.is_active = fact.standing.is_active;
                self.is_verified = fact.standing.is_verified;
            }
        }
    }

    fn holds_values_of(&self, fact: &UserFact) -> bool {
        fact.kind()
            .field_groups()
            .iter()
            .all(|group| match group {
                FieldGroup::FullName => self.full_name == fact.full_name,
                FieldGroup::Email => self.email == fact.email,
                FieldGroup::Password => fact.password_hash() == Some(self.password_hash.as_str()),
                FieldGroup::Standing => {
                    self.role == fact.standing.role
                        && self.is_active == fact.standing.is_active
                        && self.is_verified == fact.standing.is_verified
                }
            })
    }
}

/// Fold a fact into the current record of its user, if any.
///
/// A missing record is created from a `Created` fact; any other kind of fact
/// for an unknown user is an error.
///
/// # Errors
/// * `UnknownUser` - No record and the fact is not `Created`
/// * `UserMismatch` - Record and fact belong to different users
pub fn project(
    current: Option<ShadowUser>,
    fact: &UserFact,
) -> Result<(ShadowUser, ApplyOutcome), ProjectionError> {
    match current {
        Some(mut user) => {
            let outcome = user.apply(fact)?;
            Ok((user, outcome))
        }
        None => ShadowUser::from_created(fact)
            .map(|user| (user, ApplyOutcome::Applied))
            .ok_or(ProjectionError::UnknownUser(fact.user_id)),
    }
}

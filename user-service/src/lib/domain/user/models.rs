use std::fmt;
use std::str::FromStr;

use auth::normalize_email;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
pub use user_facts::UserId;
use user_facts::Standing;

use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;
use crate::user::errors::PasswordError;

/// User aggregate entity.
///
/// The canonical record; every committed change to it is published as a fact.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub full_name: FullName,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    /// Commit timestamp of the latest change; strictly increasing per user.
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn standing(&self) -> Standing {
        Standing {
            role: self.role,
            is_active: self.is_active,
            is_verified: self.is_verified,
        }
    }
}

/// Full name value type
///
/// Trimmed, non-empty and at most 100 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    const MAX_LENGTH: usize = 100;

    /// Create a new valid full name.
    ///
    /// # Errors
    /// * `Empty` - Nothing left after trimming
    /// * `TooLong` - Longer than 100 characters
    pub fn new(full_name: String) -> Result<Self, FullNameError> {
        let full_name = full_name.trim();
        let length = full_name.chars().count();
        if length == 0 {
            Err(FullNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(full_name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Stored lowercase so
/// lookups by token subject match regardless of how the address was typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = normalize_email(&email);
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    ///
    /// # Returns
    /// Email string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password awaiting hashing.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;

    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    pub fn new(password: String) -> Result<Self, PasswordError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Command to create a new user with domain types
#[derive(Debug)]
pub struct CreateUserCommand {
    pub email: EmailAddress,
    pub full_name: FullName,
    pub password: Password,
    pub role: Role,
}

impl CreateUserCommand {
    /// Construct a new create user command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `full_name` - Validated full name
    /// * `password` - Plain text password (will be hashed by service)
    /// * `role` - Requested role; admin is refused by the service
    pub fn new(email: EmailAddress, full_name: FullName, password: Password, role: Role) -> Self {
        Self {
            email,
            full_name,
            password,
            role,
        }
    }
}

/// Command to change a user's standing.
///
/// Only provided fields are changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateStatusCommand {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

/// One change to a stored user.
///
/// The store writes only the columns a change names, so concurrent changes to
/// different fields of one user never overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChange {
    FullName(FullName),
    Email(EmailAddress),
    PasswordHash(String),
    Status(UpdateStatusCommand),
}

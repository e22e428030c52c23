use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Account role, signed into every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Why an otherwise authenticated account may not receive tokens.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccountStateError {
    #[error("Account is inactive")]
    Inactive,

    #[error("Email address is not verified")]
    Unverified,
}

/// Activity and verification flags of an account.
///
/// Both services evaluate these through [`ensure_can_authenticate`](Self::ensure_can_authenticate)
/// so the checks cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub is_active: bool,
    pub is_verified: bool,
}

impl AccountStatus {
    pub fn new(is_active: bool, is_verified: bool) -> Self {
        Self {
            is_active,
            is_verified,
        }
    }

    /// Deactivation takes precedence over a missing verification.
    pub fn ensure_can_authenticate(&self) -> Result<(), AccountStateError> {
        if !self.is_active {
            return Err(AccountStateError::Inactive);
        }
        if !self.is_verified {
            return Err(AccountStateError::Unverified);
        }
        Ok(())
    }
}

/// Canonical form of an account email: trimmed and lowercased.
///
/// Applied when an address is stored and again when one is looked up, so both
/// services agree on which account an address names.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [Role::Buyer, Role::Seller, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"seller\"");
        assert!(serde_json::from_str::<Role>("\"Admin\"").is_err());
        assert_eq!(Role::default(), Role::Buyer);
    }

    #[test]
    fn test_status_checks() {
        assert_eq!(AccountStatus::new(true, true).ensure_can_authenticate(), Ok(()));
        assert_eq!(
            AccountStatus::new(false, true).ensure_can_authenticate(),
            Err(AccountStateError::Inactive)
        );
        assert_eq!(
            AccountStatus::new(true, false).ensure_can_authenticate(),
            Err(AccountStateError::Unverified)
        );
        assert_eq!(
            AccountStatus::new(false, false).ensure_can_authenticate(),
            Err(AccountStateError::Inactive)
        );
    }
}

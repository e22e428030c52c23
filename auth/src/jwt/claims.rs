use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::account::Role;

/// Distinguishes access tokens from refresh tokens.
///
/// Carried as the signed `token_type` claim; never inferred from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token that authorizes requests.
    Access,
    /// Long-lived token only accepted for minting new access tokens.
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a token asserts about its holder, before timing claims are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Stable account identifier
    pub user_id: Uuid,
    /// Subject (the account email at issuance)
    pub subject: String,
    pub kind: TokenKind,
    pub role: Role,
}

impl Grant {
    pub fn access(user_id: Uuid, subject: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            subject: subject.into(),
            kind: TokenKind::Access,
            role,
        }
    }

    pub fn refresh(user_id: Uuid, subject: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            subject: subject.into(),
            kind: TokenKind::Refresh,
            role,
        }
    }
}

/// Signed token payload.
///
/// Every field is required; a token missing any of them fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account email)
    pub sub: String,

    /// Account identifier; emails can be reassigned, this cannot
    pub uid: Uuid,

    /// Token type: access or refresh
    pub token_type: TokenKind,

    /// Role at issuance time
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Attach issuance, expiry and a random identifier to a grant.
    ///
    /// # Arguments
    /// * `grant` - Account, subject, kind and role to sign
    /// * `ttl` - Lifetime of the token
    /// * `issued_at` - Issuance instant
    pub fn from_grant(grant: &Grant, ttl: Duration, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: grant.subject.clone(),
            uid: grant.user_id,
            token_type: grant.kind,
            role: grant.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grant_sets_timing_claims() {
        let issued_at = Utc::now();
        let user_id = Uuid::new_v4();
        let claims = Claims::from_grant(
            &Grant::access(user_id, "alice@example.com", Role::Seller),
            Duration::minutes(15),
            issued_at,
        );

        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.uid, user_id);
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.iat, issued_at.timestamp());
    }

    #[test]
    fn test_unique_identifier_per_token() {
        let grant = Grant::refresh(Uuid::new_v4(), "alice@example.com", Role::Buyer);
        let now = Utc::now();

        let first = Claims::from_grant(&grant, Duration::days(1), now);
        let second = Claims::from_grant(&grant, Duration::days(1), now);

        assert_ne!(first.jti, second.jti);
        assert_eq!((first.sub, first.uid), (second.sub, second.uid));
    }

    #[test]
    fn test_token_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&TokenKind::Refresh).unwrap(),
            "\"refresh\""
        );
        let kind: TokenKind = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(kind, TokenKind::Access);
    }
}

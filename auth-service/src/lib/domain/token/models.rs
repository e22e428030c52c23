use auth::Role;
use chrono::Duration;
use user_facts::UserId;

/// Lifetimes of issued tokens and the refresh rotation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Issue a new refresh token on every refresh instead of handing back the
    /// presented one.
    pub rotate_refresh_tokens: bool,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            rotate_refresh_tokens: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity asserted by a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

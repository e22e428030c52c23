use async_trait::async_trait;

use super::errors::AuthError;
use super::models::TokenPair;
use super::models::VerifiedIdentity;

/// Port for the token lifecycle, called by the HTTP handlers.
#[async_trait]
pub trait TokenServicePort: Send + Sync + 'static {
    /// Check credentials against the shadow store and issue a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishably
    /// * `AccountState` - Account is inactive or its email unverified
    /// * `Unavailable` - Shadow store cannot be reached
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new access token.
    ///
    /// The account is re-checked, so a deactivation since the refresh token was
    /// issued is honored.
    ///
    /// # Errors
    /// * `TokenExpired` - Refresh token has expired
    /// * `InvalidToken` - Not a valid refresh token, or its account is gone
    /// * `AccountState` - Account is no longer allowed to authenticate
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Verify an access token without touching the store.
    ///
    /// A deactivated account keeps passing until its access token expires.
    ///
    /// # Errors
    /// * `TokenExpired` - Access token has expired
    /// * `InvalidToken` - Not a valid access token
    async fn verify(&self, access_token: &str) -> Result<VerifiedIdentity, AuthError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use auth::normalize_email;
use auth::CredentialVerifier;
use auth::Grant;
use auth::TokenCodec;
use auth::TokenKind;
use user_facts::ShadowUser;
use user_facts::UserId;

use super::errors::AuthError;
use super::models::TokenPair;
use super::models::TokenPolicy;
use super::models::VerifiedIdentity;
use super::ports::TokenServicePort;
use crate::domain::shadow::ports::ShadowUserRepository;

/// Domain service implementation for the token lifecycle.
///
/// Reads only the shadow store; never writes to it.
pub struct TokenService<R>
where
    R: ShadowUserRepository,
{
    repository: Arc<R>,
    codec: Arc<TokenCodec>,
    verifier: CredentialVerifier,
    policy: TokenPolicy,
}

impl<R> TokenService<R>
where
    R: ShadowUserRepository,
{
    /// Create a new token service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Shadow user storage
    /// * `codec` - Token codec holding the signing key
    /// * `verifier` - Password verifier; give it a decoy to equalise login timing
    /// * `policy` - Token lifetimes and refresh rotation
    pub fn new(
        repository: Arc<R>,
        codec: Arc<TokenCodec>,
        verifier: CredentialVerifier,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            repository,
            codec,
            verifier,
            policy,
        }
    }

    fn issue(&self, grant: &Grant) -> Result<String, AuthError> {
        let ttl = match grant.kind {
            TokenKind::Access => self.policy.access_ttl,
            TokenKind::Refresh => self.policy.refresh_ttl,
        };
        self.codec.issue(grant, ttl).map_err(AuthError::from)
    }

    fn issue_pair(&self, user: &ShadowUser) -> Result<TokenPair, AuthError> {
        let user_id = user.id.into_uuid();
        Ok(TokenPair {
            access_token: self.issue(&Grant::access(user_id, &user.email, user.role))?,
            refresh_token: self.issue(&Grant::refresh(user_id, &user.email, user.role))?,
        })
    }
}

#[async_trait]
impl<R> TokenServicePort for TokenService<R>
where
    R: ShadowUserRepository,
{
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = normalize_email(email);
        let user = match self.repository.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.verifier.burn_decoy(password);
                tracing::debug!(email = %email, "Login for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        match self.verifier.verify(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = %user.id, "Login with wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, "Stored password hash is unreadable: {}", e);
                return Err(AuthError::InvalidCredentials);
            }
        }

        user.status().ensure_can_authenticate()?;

        let pair = self.issue_pair(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.codec.verify_kind(refresh_token, TokenKind::Refresh)?;

        // The email in `sub` may have moved to another account since issuance.
        let user = self
            .repository
            .find_by_id(&UserId(claims.uid))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        user.status().ensure_can_authenticate()?;

        let user_id = user.id.into_uuid();
        let access_token = self.issue(&Grant::access(user_id, &user.email, user.role))?;
        let refresh_token = if self.policy.rotate_refresh_tokens {
            self.issue(&Grant::refresh(user_id, &user.email, user.role))?
        } else {
            refresh_token.to_string()
        };

        tracing::debug!(user_id = %user.id, "Access token refreshed");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn verify(&self, access_token: &str) -> Result<VerifiedIdentity, AuthError> {
        let claims = self.codec.verify_kind(access_token, TokenKind::Access)?;

        Ok(VerifiedIdentity {
            user_id: UserId(claims.uid),
            email: claims.sub,
            role: claims.role,
        })
    }
}

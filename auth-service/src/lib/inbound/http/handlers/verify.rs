use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::token::models::VerifiedIdentity;

/// Check the bearer access token and echo the identity it asserts.
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<VerifyResponseData>, ApiError> {
    let token = bearer_token(&headers)?;

    state
        .token_service
        .verify(token)
        .await
        .map_err(ApiError::from)
        .map(|identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyResponseData {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl From<VerifiedIdentity> for VerifyResponseData {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            user_id: identity.user_id.to_string(),
            email: identity.email,
            role: identity.role.to_string(),
        }
    }
}

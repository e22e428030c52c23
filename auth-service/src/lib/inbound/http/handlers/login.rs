use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairResponseData;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<TokenPairResponseData>, ApiError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Email and password are required".to_string(),
        ));
    }

    state
        .token_service
        .login(email, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

/// HTTP request body for a password login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

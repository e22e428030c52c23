use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairResponseData;
use crate::inbound::http::router::AppState;

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<ApiSuccess<TokenPairResponseData>, ApiError> {
    state
        .token_service
        .refresh(&body.refresh_token)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshRequest {
    refresh_token: String,
}

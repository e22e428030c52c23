use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserResponseData;
use crate::domain::user::models::FullName;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn update_full_name(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateFullNameRequest>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let full_name = FullName::new(body.full_name).map_err(UserError::from)?;

    state
        .user_service
        .rename(&caller.user_id, full_name)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateFullNameRequest {
    full_name: String,
}

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserResponseData;
use crate::domain::user::models::Password;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn update_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let password = Password::new(body.password).map_err(UserError::from)?;

    state
        .user_service
        .change_password(&caller.user_id, password)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    password: String,
}

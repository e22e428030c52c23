use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserResponseData;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// Tokens issued before the change keep naming the same account through their
/// user id; only their `sub` shows the old address until they are refreshed.
pub async fn update_email(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateEmailRequest>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let email = EmailAddress::new(body.email).map_err(UserError::from)?;

    state
        .user_service
        .change_email(&caller.user_id, email)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    email: String,
}

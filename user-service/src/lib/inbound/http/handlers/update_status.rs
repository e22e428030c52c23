use auth::Role;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserResponseData;
use crate::domain::user::models::UpdateStatusCommand;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;

pub async fn update_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<ApiSuccess<UserResponseData>, ApiError> {
    let user_id = UserId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let command = body.try_into_command()?;

    state
        .user_service
        .update_status(&user_id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// HTTP request body for an admin standing change (raw JSON)
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

impl UpdateStatusRequest {
    fn try_into_command(self) -> Result<UpdateStatusCommand, ApiError> {
        if self.role.is_none() && self.is_active.is_none() && self.is_verified.is_none() {
            return Err(ApiError::UnprocessableEntity(
                "At least one of role, is_active or is_verified is required".to_string(),
            ));
        }

        Ok(UpdateStatusCommand {
            role: self.role,
            is_active: self.is_active,
            is_verified: self.is_verified,
        })
    }
}

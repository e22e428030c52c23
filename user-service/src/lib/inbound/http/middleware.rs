use auth::Role;
use auth::TokenKind;
use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Identity of the caller, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub role: Role,
}

/// Middleware that validates access tokens and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req).map_err(IntoResponse::into_response)?;

    let claims = state
        .token_codec
        .verify_kind(token, TokenKind::Access)
        .map_err(|e| {
            tracing::warn!("Access token rejected: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string()).into_response()
        })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: UserId(claims.uid),
        role: claims.role,
    });

    Ok(next.run(req).await)
}

/// Middleware that admits only admins; runs after `authenticate`
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Response> {
    let is_admin = req
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.role.is_admin())
        .unwrap_or(false);

    if !is_admin {
        return Err(ApiError::Forbidden("Not enough permissions".to_string()).into_response());
    }

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
    })
}

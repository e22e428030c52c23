use std::sync::Arc;
use std::time::Duration;

use auth::TokenCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_user;
use super::handlers::health::health;
use super::handlers::update_email::update_email;
use super::handlers::update_full_name::update_full_name;
use super::handlers::update_password::update_password;
use super::handlers::update_status::update_status;
use super::middleware::authenticate;
use super::middleware::require_admin;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    /// Verify-only codec for access tokens issued by the auth service
    pub token_codec: Arc<TokenCodec>,
}

pub fn create_router(user_service: Arc<dyn UserServicePort>, token_codec: Arc<TokenCodec>) -> Router {
    let state = AppState {
        user_service,
        token_codec,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/v1/users", post(create_user));

    let protected_routes = Router::new()
        .route("/api/v1/users/me/full-name", patch(update_full_name))
        .route("/api/v1/users/me/email", patch(update_email))
        .route("/api/v1/users/me/password", patch(update_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Layers run outside-in: authenticate, then the admin check.
    let admin_routes = Router::new()
        .route("/api/v1/admin/users/:user_id/status", patch(update_status))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! Admin-only routes

use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use parlor_auth::{AuthUser, require_admin, require_auth};

use super::health::timestamp;
use super::types::HealthResponse;
use crate::state::AppState;

/// GET /api/admin/ping
async fn ping(user: AuthUser) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        user: Some(user),
        timestamp: timestamp(),
    })
}

/// Create admin routes
pub fn routes(state: &AppState) -> Router<AppState> {
    // The last layer added runs first: authenticate, then check the role.
    Router::new()
        .route("/api/admin/ping", get(ping))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.authenticator(), require_auth))
}

//! Health check endpoints

use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use chrono::{SecondsFormat, Utc};
use parlor_auth::{AuthUser, require_auth};

use super::types::HealthResponse;
use crate::state::AppState;

/// Current time as RFC 3339 UTC with millisecond precision
pub(super) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    metrics::counter!("parlor_health_checks_total").increment(1);

    Json(HealthResponse {
        success: true,
        status: "ok",
        user: None,
        timestamp: timestamp(),
    })
}

/// GET /api/health/secure
async fn secure_health(user: AuthUser) -> Json<HealthResponse> {
    metrics::counter!("parlor_health_checks_total").increment(1);

    Json(HealthResponse {
        success: true,
        status: "ok",
        user: Some(user),
        timestamp: timestamp(),
    })
}

/// Create health routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/health/secure", get(secure_health))
        .route_layer(from_fn_with_state(state.authenticator(), require_auth));

    Router::new()
        .route("/api/health", get(health))
        .merge(protected)
}

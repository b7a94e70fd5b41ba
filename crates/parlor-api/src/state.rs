//! Application state

use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;
use parlor_auth::{Authenticator, JwtManager};
use parlor_db::Database;
use std::sync::Arc;

/// Prometheus handle used to render `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Immutable HTTP-facing settings resolved at startup
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Production mode hardens the session cookie
    pub production: bool,
    /// The single origin allowed to make credentialed cross-origin requests
    pub client_origin: HeaderValue,
}

impl ApiConfig {
    pub fn new(production: bool, client_origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            production,
            client_origin: HeaderValue::from_str(client_origin)?,
        })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, jwt: Arc<JwtManager>, config: ApiConfig) -> Self {
        Self {
            db,
            jwt,
            config: Arc::new(config),
        }
    }

    /// State for the `require_auth` middleware
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.jwt.clone(), self.db.clone())
    }
}

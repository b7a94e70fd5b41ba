//! Parlor REST API
//!
//! This crate provides the Axum-based HTTP API for Parlor:
//! account registration and login, session endpoints and health checks.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState, MetricsHandle};

//! Request/Response DTOs

use parlor_auth::AuthUser;
use parlor_db::PublicUser;
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Register request
///
/// Fields are optional so that absent values surface as validation
/// errors rather than body rejections.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login request
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Register/login response
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

/// Response carrying only a message
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Current user response
#[derive(Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: AuthUser,
}

// ==================== Health Types ====================

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
    pub timestamp: String,
}

//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing token")]
    MissingToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("User not found")]
    UserNotFound,

    #[error("Token expiry out of range")]
    ExpiryOutOfRange,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::PasswordHash(_) | AuthError::ExpiryOutOfRange => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message shown to clients; never carries internal detail
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::MissingToken => "Not authorized, token missing",
            AuthError::UserNotFound => "Not authorized, user not found",
            AuthError::InvalidToken | AuthError::Jwt(_) => "Not authorized",
            AuthError::InsufficientPermissions => "Admin access only",
            AuthError::PasswordHash(_) | AuthError::ExpiryOutOfRange => "Internal error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (self.status(), body).into_response()
    }
}

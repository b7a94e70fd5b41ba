//! Parlor Authentication and Authorization
//!
//! This crate provides JWT session tokens, password hashing and
//! the Axum middleware that protects routes and gates them by role.

pub mod cookie;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use cookie::{clear_session_cookie, session_cookie, TOKEN_COOKIE};
pub use error::AuthError;
pub use jwt::{Claims, JwtManager};
pub use middleware::{require_admin, require_auth, AuthUser, Authenticator};
pub use password::{hash_password, verify_password, verify_password_or_burn};

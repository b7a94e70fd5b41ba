//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use parlor_db::{Database, PublicUser, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cookie::TOKEN_COOKIE;
use crate::error::AuthError;
use crate::jwt::JwtManager;

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<PublicUser> for AuthUser {
    fn from(user: PublicUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Extract the session token from a request
///
/// A non-empty `Authorization: Bearer` header wins; otherwise the `token`
/// cookie is used.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        CookieJar::from_headers(headers)
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// State for the authentication middleware
#[derive(Clone)]
pub struct Authenticator {
    jwt: Arc<JwtManager>,
    db: Database,
}

impl Authenticator {
    pub fn new(jwt: Arc<JwtManager>, db: Database) -> Self {
        Self { jwt, db }
    }

    /// Resolve the identity behind a request's token
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = extract_token(headers).ok_or(AuthError::MissingToken)?;

        let user_id = self.jwt.verify(&token)?.user_id()?;

        let user = self
            .db
            .get_user_by_id(user_id)
            .await
            .map_err(|e| {
                warn!("Auth error: user lookup failed: {}", e);
                AuthError::InvalidToken
            })?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthUser::from(PublicUser::from(user)))
    }
}

/// Authentication middleware
///
/// Rejects the request with 401 unless it carries a valid token for an
/// existing user. On success the [`AuthUser`] is added to request extensions.
pub async fn require_auth(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = auth.authenticate(request.headers()).await.inspect_err(|e| {
        debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
    })?;

    debug!("Authenticated user: {} ({})", user.email, user.role.as_str());

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Middleware to require admin role
///
/// Must run after [`require_auth`]. A request without an identity is
/// forbidden, same as a non-admin one.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    let is_admin = match request.extensions().get::<AuthUser>() {
        Some(user) if user.role.is_admin() => true,
        Some(user) => {
            debug!("Admin gate rejected user {}", user.email);
            false
        }
        None => {
            debug!("Admin gate reached without an identity");
            false
        }
    };

    if !is_admin {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

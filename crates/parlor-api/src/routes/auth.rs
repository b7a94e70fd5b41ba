//! Account routes: register, login, logout and current user

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use parlor_auth::{
    AuthError, AuthUser, clear_session_cookie, hash_password, require_auth, session_cookie,
    verify_password_or_burn,
};
use parlor_db::{DbError, NewUser, User, UserRole, utils::normalize_email};
use tracing::{debug, info, warn};

use super::types::{AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

// ==================== Input Validation ====================

/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 6;

const REGISTER_FAILED: &str = "Server error registering user";
const LOGIN_FAILED: &str = "Server error logging in";

/// Treat absent and empty values alike
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Validated registration input
struct Registration {
    name: String,
    email: String,
    password: String,
    role: UserRole,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = ApiError;

    fn try_from(request: RegisterRequest) -> Result<Self, Self::Error> {
        let name = present(request.name.map(|n| n.trim().to_string()));
        let email = present(request.email.map(|e| normalize_email(&e)));
        let password = present(request.password);

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(ApiError::BadRequest(
                "Name, email, and password are required".to_string(),
            ));
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Ok(Self {
            name,
            email,
            password,
            role: UserRole::from_requested(request.role.as_deref()),
        })
    }
}

// ==================== Helpers ====================

fn duplicate_email() -> ApiError {
    ApiError::BadRequest("User with this email already exists".to_string())
}

/// Map a failed insert; a lost race on the unique email is still a 400
fn insert_failure(e: DbError) -> ApiError {
    if e.is_duplicate() {
        duplicate_email()
    } else {
        ApiError::internal(REGISTER_FAILED, e)
    }
}

/// Run password hashing off the async executor
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(REGISTER_FAILED, e))?
        .map_err(|e| ApiError::internal(REGISTER_FAILED, e))
}

/// Run password verification off the async executor
async fn verify_blocking(password: String, hash: Option<String>) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password_or_burn(&password, hash.as_deref()))
        .await
        .map_err(|e| ApiError::internal(LOGIN_FAILED, e))?
        .map_err(|e| ApiError::internal(LOGIN_FAILED, e))
}

/// Issue a token for `user` and attach it as the session cookie
fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
    failure: &str,
) -> Result<(CookieJar, String), ApiError> {
    let token = state
        .jwt
        .issue(user.id)
        .map_err(|e| ApiError::internal(failure, e))?;

    let cookie = session_cookie(token.clone(), state.jwt.max_age(), state.config.production);
    Ok((jar.add(cookie), token))
}

// ==================== Auth Routes ====================

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let registration = Registration::try_from(request)?;

    debug!("Registration attempt for {}", registration.email);

    // Checked here so a taken email is rejected before paying for a hash.
    let existing = state
        .db
        .get_user_by_email(&registration.email)
        .await
        .map_err(|e| ApiError::internal(REGISTER_FAILED, e))?;
    if existing.is_some() {
        return Err(duplicate_email());
    }

    let password_hash = hash_blocking(registration.password).await?;

    let user = state
        .db
        .insert_user(NewUser {
            name: registration.name,
            email: registration.email,
            password_hash,
            role: registration.role,
        })
        .await
        .map_err(insert_failure)?;

    let (jar, token) = start_session(&state, jar, &user, REGISTER_FAILED)?;

    metrics::counter!("parlor_registrations_total").increment(1);
    info!("Registered user {} ({})", user.email, user.role.as_str());

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully",
            token,
            user: user.to_public(),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let (Some(email), Some(password)) = (present(request.email), present(request.password)) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };
    let email = normalize_email(&email);

    debug!("Login attempt for {}", email);

    let user = state
        .db
        .get_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal(LOGIN_FAILED, e))?;

    // Unknown email and wrong password must be indistinguishable to the caller.
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password_valid = verify_blocking(password, stored_hash).await?;

    let user = match (user, password_valid) {
        (Some(user), true) => user,
        _ => {
            metrics::counter!("parlor_logins_total", "outcome" => "failure").increment(1);
            warn!("Rejected login for {}", email);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let (jar, token) = start_session(&state, jar, &user, LOGIN_FAILED)?;

    metrics::counter!("parlor_logins_total", "outcome" => "success").increment(1);
    info!("User {} logged in successfully", user.email);

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            message: "Logged in successfully",
            token,
            user: user.to_public(),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Only clears the cookie; an already issued token stays valid until it expires.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(clear_session_cookie()),
        Json(MessageResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
}

/// GET /api/auth/me
async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        user,
    })
}

/// Create auth routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(from_fn_with_state(state.authenticator(), require_auth));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .merge(protected)
}

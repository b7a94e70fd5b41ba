//! Session cookie construction

use axum_extra::extract::cookie::{Cookie, SameSite};

/// Name of the cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

/// Build the httpOnly cookie that carries a freshly issued token
///
/// Production cookies are `Secure` and `SameSite=Strict`; elsewhere they are
/// `SameSite=Lax` so plain-HTTP local development keeps working.
pub fn session_cookie(token: String, max_age: chrono::Duration, production: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(production)
        .same_site(if production { SameSite::Strict } else { SameSite::Lax })
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Removal cookie that expires the session cookie on the client
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((TOKEN_COOKIE, "")).path("/").http_only(true).build();
    cookie.make_removal();
    cookie
}

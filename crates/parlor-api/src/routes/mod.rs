//! API routes

mod admin;
mod auth;
mod health;
pub mod metrics;
mod types;

use axum::{
    Router,
    http::{HeaderValue, Method, Uri, header},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

/// Fallback for unmatched routes
async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Not found - {}", uri.path()))
}

/// CORS policy: one trusted origin, cookies allowed
fn cors_layer(state: &AppState) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(state.config.client_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let cors = cors_layer(&state);

    let mut router = Router::new()
        .merge(auth::routes(&state))
        .merge(health::routes(&state))
        .merge(admin::routes(&state))
        .fallback(not_found)
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ApiConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use parlor_auth::JwtManager;
    use parlor_db::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    async fn test_app_with(production: bool) -> Router {
        let db = Database::in_memory().await.unwrap();
        let jwt = Arc::new(JwtManager::new(SECRET, Duration::days(7)));
        let config = ApiConfig::new(production, "http://localhost:5000").unwrap();
        create_router(AppState::new(db, jwt, config), None)
    }

    async fn test_app() -> Router {
        test_app_with(false).await
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with(uri: &str, auth: Option<(&str, &str)>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some((name, value)) = auth {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookie(response: &Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn register(app: &Router, email: &str, password: &str, role: Option<&str>) -> Value {
        let mut body = json!({"name": "Test User", "email": email, "password": password});
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        let response = send(app, post_json("/api/auth/register", body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_register_returns_token_and_public_user() {
        let app = test_app().await;

        let response = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({"name": "Ada", "email": "Ada@Example.com", "password": "secret1"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["name"], "Ada");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password_hash").is_none());
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_production_cookie_is_secure_and_strict() {
        let app = test_app_with(true).await;

        let response = send(
            &app,
            post_json(
                "/api/auth/register",
                json!({"name": "Ada", "email": "ada@example.com", "password": "secret1"}),
            ),
        )
        .await;

        let cookie = set_cookie(&response);
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_app().await;

        let cases = [
            (json!({"email": "a@b.c", "password": "secret1"}), "Name, email, and password are required"),
            (json!({"name": "A", "password": "secret1"}), "Name, email, and password are required"),
            (json!({"name": "A", "email": "a@b.c"}), "Name, email, and password are required"),
            (json!({"name": "A", "email": "a@b.c", "password": "12345"}), "Password must be at least 6 characters"),
        ];

        for (body, message) in cases {
            let response = send(&app, post_json("/api/auth/register", body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], message);
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let app = test_app().await;
        register(&app, "ada@example.com", "secret1", None).await;

        for email in ["ada@example.com", "ADA@example.COM", "  Ada@Example.com "] {
            let response = send(
                &app,
                post_json(
                    "/api/auth/register",
                    json!({"name": "Someone Else", "email": email, "password": "different-pw"}),
                ),
            )
            .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert_eq!(body["message"], "User with this email already exists");
        }
    }

    #[tokio::test]
    async fn test_register_then_login_yields_same_user() {
        let app = test_app().await;
        let registered = register(&app, "grace@example.com", "hopper42", None).await;
        let user_id = registered["user"]["id"].as_i64().unwrap();

        let response = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({"email": "GRACE@example.com", "password": "hopper42"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie(&response).starts_with("token="));
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Logged in successfully");
        assert_eq!(body["user"]["id"].as_i64(), Some(user_id));

        let verifier = JwtManager::new(SECRET, Duration::days(7));
        let claims = verifier.verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = test_app().await;
        register(&app, "grace@example.com", "hopper42", None).await;

        let wrong_password = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({"email": "grace@example.com", "password": "wrong-password"}),
            ),
        )
        .await;
        let unknown_email = send(
            &app,
            post_json(
                "/api/auth/login",
                json!({"email": "nobody@example.com", "password": "wrong-password"}),
            ),
        )
        .await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
        assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());

        let a = json_body(wrong_password).await;
        let b = json_body(unknown_email).await;
        assert_eq!(a, b);
        assert_eq!(a, json!({"success": false, "message": "Invalid credentials"}));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let app = test_app().await;

        let response = send(&app, post_json("/api/auth/login", json!({"email": "a@b.c"}))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_me_with_bearer_and_cookie() {
        let app = test_app().await;
        let registered = register(&app, "ada@example.com", "secret1", None).await;
        let token = registered["token"].as_str().unwrap();

        let response = send(&app, get_with("/api/auth/me", Some(("authorization", &bearer(token))))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user"], registered["user"]);

        let cookie = format!("token={}", token);
        let response = send(&app, get_with("/api/auth/me", Some(("cookie", &cookie)))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_expired_and_tampered_tokens() {
        let app = test_app().await;
        let registered = register(&app, "ada@example.com", "secret1", None).await;
        let user_id = registered["user"]["id"].as_i64().unwrap();
        let token = registered["token"].as_str().unwrap().to_string();

        let expired = JwtManager::new(SECRET, Duration::seconds(-120)).issue(user_id).unwrap();
        let forged = JwtManager::new("some-other-secret", Duration::days(7)).issue(user_id).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();
        let tampered = format!("{}.{}", head, signature.chars().rev().collect::<String>());

        let response = send(&app, get_with("/api/health/secure", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Not authorized, token missing");

        for bad in [expired, forged, tampered] {
            let response = send(&app, get_with("/api/health/secure", Some(("authorization", &bearer(&bad))))).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = json_body(response).await;
            assert_eq!(body, json!({"success": false, "message": "Not authorized"}));
        }
    }

    #[tokio::test]
    async fn test_admin_gate_by_role() {
        let app = test_app().await;
        let user = register(&app, "user@example.com", "secret1", None).await;
        let admin = register(&app, "admin@example.com", "secret1", Some("admin")).await;
        assert_eq!(admin["user"]["role"], "admin");

        let user_token = bearer(user["token"].as_str().unwrap());
        let response = send(&app, get_with("/api/admin/ping", Some(("authorization", &user_token)))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["message"], "Admin access only");

        let admin_token = bearer(admin["token"].as_str().unwrap());
        let response = send(&app, get_with("/api/admin/ping", Some(("authorization", &admin_token)))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["user"]["email"], "admin@example.com");

        let response = send(&app, get_with("/api/admin/ping", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = test_app().await;
        let registered = register(&app, "ada@example.com", "secret1", None).await;
        let session = format!("token={}", registered["token"].as_str().unwrap());

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .header(header::COOKIE, &session)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let cleared = set_cookie(&response);
        assert!(cleared.starts_with("token=;"));
        assert!(cleared.contains("Max-Age=0"));
        let body = json_body(response).await;
        assert_eq!(body, json!({"success": true, "message": "Logged out successfully"}));

        // A client honouring the removal sends no token cookie afterwards.
        let response = send(&app, get_with("/api/auth/me", Some(("cookie", "token=")))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = send(&app, get_with("/api/auth/me", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_without_session_succeeds() {
        let app = test_app().await;

        for _ in 0..2 {
            let response = send(&app, post_json("/api/auth/logout", json!({}))).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(set_cookie(&response).contains("Max-Age=0"));
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = test_app().await;

        let response = send(&app, get_with("/api/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "ok");
        assert!(body.get("user").is_none());
        let stamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).unwrap() <= Utc::now());

        let registered = register(&app, "ada@example.com", "secret1", None).await;
        let token = bearer(registered["token"].as_str().unwrap());
        let response = send(&app, get_with("/api/health/secure", Some(("authorization", &token)))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["user"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = test_app().await;

        let response = send(&app, get_with("/api/nope", None)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body, json!({"success": false, "message": "Not found - /api/nope"}));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let app = test_app().await;

        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://localhost:5000")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}

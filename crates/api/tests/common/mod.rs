//! Common test utilities for integration tests.
//!
//! The application is built on in-memory stores so these tests run without a
//! database. Repository coverage against PostgreSQL lives in the persistence crate.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use domain::models::{NewUser, RoleSet};
use domain::services::{InMemoryWaitlistStore, WaitlistStore};
use fake::{faker::name::en::Name, Fake};
use serde_json::{json, Value};
use std::sync::Arc;
use subtrack_api::{
    app::{create_app, Stores},
    config::{
        AdminBootstrapConfig, Config, CookieConfig, DatabaseConfig, FrontendConfig,
        LoggingConfig, SecurityConfig, ServerConfig, SessionConfig,
    },
};
use uuid::Uuid;

pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Test configuration with rate limiting disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_size: 65_536,
        },
        database: DatabaseConfig {
            url: "postgres://unused@localhost/unused".to_string(),
            max_connections: 1,
            min_connections: 0,
            connect_timeout_secs: 1,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0,
            hsts_enabled: false,
            hsts_max_age_secs: 31_536_000,
        },
        session: SessionConfig {
            ttl_secs: 86_400,
            max_failed_login_attempts: 3,
            cleanup_interval_minutes: 60,
        },
        cookie: CookieConfig::default(),
        admin: AdminBootstrapConfig::default(),
        frontend: FrontendConfig::default(),
    }
}

/// Build the router on fresh in-memory stores.
pub fn create_test_app(config: Config) -> (Router, Stores) {
    let stores = Stores::in_memory(config.session.ttl());
    let app = create_app(config, stores.clone(), None);
    (app, stores)
}

/// Build the router with a waitlist store whose every call fails.
pub fn create_failing_waitlist_app() -> Router {
    let config = test_config();
    let mut stores = Stores::in_memory(config.session.ttl());
    let failing: Arc<dyn WaitlistStore> = Arc::new(InMemoryWaitlistStore::failing());
    stores.waitlist = failing;
    create_app(config, stores, None)
}

/// Generate a unique email for testing.
pub fn unique_test_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4().simple())
}

/// A random display name for signups.
pub fn fake_name() -> String {
    Name().fake()
}

/// Seed a user whose roles are stored in the legacy record form.
pub async fn seed_user(stores: &Stores, email: &str, roles: Value) -> Uuid {
    let password_hash =
        shared::password::hash_password(ADMIN_PASSWORD).expect("Failed to hash password");

    stores
        .users
        .create(NewUser {
            email: email.to_lowercase(),
            display_name: Some("Test Admin".to_string()),
            password_hash: Some(password_hash),
            email_verified: true,
            roles: RoleSet::from_stored(&roles),
        })
        .await
        .expect("Failed to seed user")
        .id
}

pub async fn seed_admin(stores: &Stores, email: &str) -> Uuid {
    seed_user(stores, email, json!([{ "id": "2", "name": "admin" }])).await
}

/// Build a JSON request.
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Build a bodyless request carrying the given cookie header.
pub fn request_with_cookie(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

/// Parse a response body as JSON.
pub async fn parse_response_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

pub async fn response_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// The `name=value` pair of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("admin_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Log in and return the `admin_session=<token>` cookie pair.
pub async fn login_cookie(app: &Router, email: &str) -> String {
    use tower::ServiceExt;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/auth",
            json!({ "email": email, "password": ADMIN_PASSWORD }),
        ))
        .await
        .expect("Login request failed");
    assert_eq!(response.status(), 200, "login should succeed");
    session_cookie(&response).expect("login should set the session cookie")
}

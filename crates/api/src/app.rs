use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    InMemorySessionStore, InMemoryUserStore, InMemoryWaitlistStore, SessionStore, UserStore,
    WaitlistStore,
};
use persistence::repositories::{AdminSessionRepository, UserRepository, WaitlistRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, SecurityConfig};
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin_session,
    security_headers_middleware, trace_id, RateLimiterState, SecurityHeaders,
};
use crate::routes::{admin_auth, admin_waitlist, frontend, health, waitlist};
use crate::services::{AdminAuthService, CookieHelper};

/// The three stores the application runs on.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub waitlist: Arc<dyn WaitlistStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool, session_ttl: chrono::Duration) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            sessions: Arc::new(AdminSessionRepository::new(pool.clone(), session_ttl)),
            waitlist: Arc::new(WaitlistRepository::new(pool)),
        }
    }

    /// Process-local stores. Data is lost on restart.
    pub fn in_memory(session_ttl: chrono::Duration) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::new()),
            sessions: Arc::new(InMemorySessionStore::new(session_ttl)),
            waitlist: Arc::new(InMemoryWaitlistStore::new()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub waitlist: Arc<dyn WaitlistStore>,
    /// `None` when running on in-memory stores.
    pub pool: Option<PgPool>,
    pub admin_auth: AdminAuthService,
    pub cookies: CookieHelper,
    pub rate_limiter: RateLimiterState,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, pool: Option<PgPool>) -> Self {
        let admin_auth = AdminAuthService::new(
            stores.users,
            stores.sessions,
            config.session.max_failed_login_attempts,
        );
        let cookies = CookieHelper::new(config.cookie.clone());
        let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute);

        Self {
            config: Arc::new(config),
            waitlist: stores.waitlist,
            pool,
            admin_auth,
            cookies,
            rate_limiter,
        }
    }
}

fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        // Development: any origin, no credentials.
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    // Credentialed CORS may not use wildcards.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
        .allow_credentials(true)
}

pub fn create_app(config: Config, stores: Stores, pool: Option<PgPool>) -> Router {
    let state = AppState::new(config, stores, pool);
    let config = state.config.clone();

    // Only the public POSTs are rate limited per client.
    let rate_limited = middleware::from_fn_with_state(state.clone(), rate_limit_middleware);

    let public_routes = Router::new()
        .route(
            "/api/waitlist",
            post(waitlist::signup)
                .route_layer(rate_limited.clone())
                .get(waitlist::count),
        )
        .route(
            "/api/admin/auth",
            post(admin_auth::login)
                .route_layer(rate_limited.clone())
                .get(admin_auth::session)
                .delete(admin_auth::logout),
        )
        .route(
            "/api/admin/auth/revalidate",
            post(admin_auth::revalidate).route_layer(rate_limited.clone()),
        )
        .route(
            "/api/admin/auth/refresh",
            post(admin_auth::refresh).route_layer(rate_limited),
        );

    let admin_routes = Router::new()
        .route(
            "/api/admin/waitlist",
            get(admin_waitlist::list)
                .patch(admin_waitlist::update)
                .delete(admin_waitlist::delete),
        )
        .route("/api/admin/waitlist/export", get(admin_waitlist::export))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_session,
        ));

    let mut app = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .merge(public_routes)
        .merge(admin_routes);

    if config.frontend.enabled {
        app = app.fallback(frontend::serve_frontend);
    }

    app.layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            SecurityHeaders::from_config(&config.security),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security))
        .with_state(state)
}

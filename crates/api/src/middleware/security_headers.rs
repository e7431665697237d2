//! Security headers middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

/// Header values added to every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    hsts: Option<HeaderValue>,
}

impl SecurityHeaders {
    /// HSTS is only sent when enabled; it belongs behind real TLS termination.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let hsts = config
            .hsts_enabled
            .then(|| {
                HeaderValue::from_str(&format!(
                    "max-age={}; includeSubDomains",
                    config.hsts_max_age_secs
                ))
                .ok()
            })
            .flatten();
        Self { hsts }
    }
}

/// Adds `nosniff`, frame denial, legacy XSS filtering, a referrer policy and
/// optionally `Strict-Transport-Security`.
pub async fn security_headers_middleware(
    State(config): State<SecurityHeaders>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Some(hsts) = config.hsts {
        headers.insert(header::STRICT_TRANSPORT_SECURITY, hsts);
    }

    response
}

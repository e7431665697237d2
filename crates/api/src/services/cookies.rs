//! Admin session cookie helper.
//!
//! Builds `Set-Cookie` values for the httpOnly admin session cookie and
//! reads the token back out of the `Cookie` header.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::CookieConfig;

/// Cookie helper for the admin session cookie.
#[derive(Debug, Clone)]
pub struct CookieHelper {
    config: CookieConfig,
}

impl CookieHelper {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    /// `Set-Cookie` value carrying a session token.
    pub fn build_session_cookie(&self, token: &str) -> String {
        let cookie = format!(
            "{}={}; Path={}; Max-Age={}",
            self.config.name, token, self.config.path, self.config.max_age_secs
        );
        self.with_attributes(cookie)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn build_clear_cookie(&self) -> String {
        let cookie = format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.config.name, self.config.path
        );
        self.with_attributes(cookie)
    }

    fn with_attributes(&self, mut cookie: String) -> String {
        cookie.push_str("; HttpOnly");

        if self.config.secure {
            cookie.push_str("; Secure");
        }

        cookie.push_str(&format!("; SameSite={}", self.config.same_site));

        if !self.config.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.config.domain));
        }

        cookie
    }

    /// Appends the session cookie to response headers.
    pub fn set_session(&self, headers: &mut HeaderMap, token: &str) {
        append_set_cookie(headers, &self.build_session_cookie(token));
    }

    /// Appends a clearing cookie to response headers.
    pub fn clear_session(&self, headers: &mut HeaderMap) {
        append_set_cookie(headers, &self.build_clear_cookie());
    }

    /// The session token from the request's `Cookie` header. Empty values count as absent.
    pub fn extract_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        extract_cookie(headers, &self.config.name).filter(|v| !v.is_empty())
    }
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Refusing to emit malformed Set-Cookie header"),
    }
}

/// Extract a cookie value from request headers by name.
pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            let (cookie_name, cookie_value) = cookie.split_once('=')?;
            (cookie_name == name).then_some(cookie_value)
        })
}

//! Admin login, session check, logout and token rotation.
//!
//! The session token travels in the httpOnly `admin_session` cookie. Login and
//! refresh also return it in the body for clients that cannot read cookies.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_admin_login;
use crate::services::{AdminAuthError, AdminIdentity};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub authenticated: bool,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AdminIdentity,
}

/// Body of the session check and revalidate endpoints.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AdminIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct RevalidateRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

const NO_SESSION: &str = "no_session";
const INVALID_SESSION: &str = "invalid_session";

/// 401 with `{authenticated:false, reason}`. Clears the cookie when asked.
fn unauthenticated(state: &AppState, reason: &'static str, clear_cookie: bool) -> Response {
    let mut headers = HeaderMap::new();
    if clear_cookie {
        state.cookies.clear_session(&mut headers);
    }
    (
        StatusCode::UNAUTHORIZED,
        headers,
        Json(SessionStatus {
            authenticated: false,
            user: None,
            reason: Some(reason),
        }),
    )
        .into_response()
}

/// Log in with email and password.
///
/// POST /api/admin/auth
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let login = match state
        .admin_auth
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(login) => login,
        Err(e) => {
            record_admin_login(match &e {
                AdminAuthError::InvalidCredentials => "invalid_credentials",
                AdminAuthError::AccountIssue(_) => "account_issue",
                AdminAuthError::Store(_) | AdminAuthError::Password(_) => "error",
            });
            return Err(e.into());
        }
    };
    record_admin_login("success");

    let mut headers = HeaderMap::new();
    state.cookies.set_session(&mut headers, &login.session.token);

    let body = LoginResponse {
        authenticated: true,
        session_token: login.session.token,
        expires_at: login.session.expires_at,
        user: login.user,
    };

    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// Report the admin behind the session cookie.
///
/// GET /api/admin/auth
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(token) = state.cookies.extract_token(&headers) else {
        return Ok(unauthenticated(&state, NO_SESSION, false));
    };

    match state.admin_auth.current_admin(token).await? {
        Some(admin) => Ok(Json(SessionStatus {
            authenticated: true,
            user: Some(admin),
            reason: None,
        })
        .into_response()),
        None => Ok(unauthenticated(&state, INVALID_SESSION, true)),
    }
}

/// Revoke the session and clear the cookie. Succeeds without a session too.
///
/// DELETE /api/admin/auth
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = state.cookies.extract_token(&headers) {
        state.admin_auth.logout(token).await?;
    }

    let mut response_headers = HeaderMap::new();
    state.cookies.clear_session(&mut response_headers);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(SuccessResponse { success: true }),
    )
        .into_response())
}

/// Re-establish the cookie from a token the client still holds.
///
/// POST /api/admin/auth/revalidate
pub async fn revalidate(
    State(state): State<AppState>,
    payload: Result<Json<RevalidateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let token = request.token.trim();

    match state.admin_auth.current_admin(token).await? {
        Some(admin) => {
            let mut headers = HeaderMap::new();
            state.cookies.set_session(&mut headers, token);
            Ok((
                StatusCode::OK,
                headers,
                Json(SessionStatus {
                    authenticated: true,
                    user: Some(admin),
                    reason: None,
                }),
            )
                .into_response())
        }
        None => Ok(unauthenticated(&state, INVALID_SESSION, false)),
    }
}

/// Rotate the session token and extend its expiry.
///
/// POST /api/admin/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(token) = state.cookies.extract_token(&headers) else {
        return Ok(unauthenticated(&state, NO_SESSION, false));
    };

    let Some(issued) = state.admin_auth.refresh(token).await? else {
        return Ok(unauthenticated(&state, INVALID_SESSION, true));
    };

    let mut response_headers = HeaderMap::new();
    state.cookies.set_session(&mut response_headers, &issued.token);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(RefreshResponse {
            success: true,
            session_token: issued.token,
            expires_at: issued.expires_at,
        }),
    )
        .into_response())
}

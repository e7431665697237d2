//! Admin session gate.
//!
//! Resolves the `admin_session` cookie to an [`AdminIdentity`] and rejects the
//! request when there is none. Store failures reject the request as well.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::AdminIdentity;

pub async fn require_admin_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match resolve_admin(&state, req.headers()).await {
        Ok(admin) => {
            tracing::debug!(admin_id = %admin.id, "Admin session accepted");
            req.extensions_mut().insert(admin);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

async fn resolve_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminIdentity, ApiError> {
    let token = state
        .cookies
        .extract_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Admin session required".to_string()))?;

    state
        .admin_auth
        .current_admin(token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired admin session".to_string()))
}

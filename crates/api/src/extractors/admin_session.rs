//! Authenticated admin extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::services::AdminIdentity;

/// The admin resolved by [`require_admin_session`](crate::middleware::require_admin_session).
///
/// Only usable on routes behind that middleware; elsewhere it rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin(pub AdminIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminIdentity>()
            .cloned()
            .map(AuthenticatedAdmin)
            .ok_or_else(|| ApiError::Unauthorized("Admin session required".to_string()))
    }
}

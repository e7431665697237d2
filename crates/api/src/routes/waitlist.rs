//! Public waitlist signup and count.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use domain::models::{normalize_interests, NewWaitlistEntry, DEFAULT_SOURCE};
use domain::services::StoreError;
use serde::{Deserialize, Serialize};
use shared::validation::{normalize_email, validate_interests, validate_source_tag};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_waitlist_signup;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_source_tag"))]
    pub source: Option<String>,

    #[validate(custom(function = "validate_interests"))]
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Join the waitlist.
///
/// POST /api/waitlist
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(mut request) = payload?;
    request.email = request.email.trim().to_string();
    request.name = request.name.trim().to_string();
    request.validate()?;

    let entry = NewWaitlistEntry {
        email: normalize_email(&request.email),
        name: request.name,
        source: request
            .source
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        interests: normalize_interests(&request.interests.unwrap_or_default()),
    };

    match state.waitlist.create(entry).await {
        Ok(created) => {
            record_waitlist_signup("created");
            tracing::info!(entry_id = %created.id, source = %created.source, "Waitlist signup");
            Ok((
                StatusCode::CREATED,
                Json(SignupResponse {
                    success: true,
                    id: created.id,
                }),
            ))
        }
        Err(StoreError::Conflict(_)) => {
            record_waitlist_signup("duplicate");
            Err(ApiError::EmailExists)
        }
        Err(e) => {
            record_waitlist_signup("error");
            Err(e.into())
        }
    }
}

/// Number of people on the waitlist. Nothing else is exposed publicly.
///
/// GET /api/waitlist
pub async fn count(State(state): State<AppState>) -> Result<Json<CountResponse>, ApiError> {
    let count = state.waitlist.count().await?;
    Ok(Json(CountResponse { count }))
}

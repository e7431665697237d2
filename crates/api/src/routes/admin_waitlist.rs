//! Admin waitlist management. Every route here sits behind the admin session gate.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use domain::models::{WaitlistEntry, WaitlistQuery, WaitlistStats, WaitlistUpdate};
use serde::{Deserialize, Serialize};
use shared::validation::validate_tag;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthenticatedAdmin;

/// Window for the `lastWeek` statistic.
const LAST_WEEK_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    fn new(query: &WaitlistQuery, total: i64) -> Self {
        let per_page = i64::from(query.per_page.max(1));
        Self {
            page: query.page,
            per_page: query.per_page,
            total,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<WaitlistEntry>,
    pub pagination: Pagination,
    pub stats: WaitlistStats,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: Uuid,
    pub contacted: Option<bool>,
    pub converted_to_customer: Option<bool>,

    #[validate(length(min = 1, max = 2000, message = "Note must be 1-2000 characters"))]
    pub note: Option<String>,

    #[validate(custom(function = "validate_tag"))]
    pub tag: Option<String>,
}

impl UpdateRequest {
    /// Trims the note so the length check sees what would be stored.
    fn trimmed(mut self) -> Self {
        self.note = self.note.map(|n| n.trim().to_string());
        self
    }

    fn into_update(self) -> WaitlistUpdate {
        WaitlistUpdate {
            contacted: self.contacted,
            converted_to_customer: self.converted_to_customer,
            note: self.note,
            tag: self.tag,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// One page of entries plus dashboard statistics.
///
/// GET /api/admin/waitlist
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<WaitlistQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query?;
    query.validate()?;

    let (data, total) = state.waitlist.list(&query).await?;
    let stats = state
        .waitlist
        .stats(Utc::now() - Duration::days(LAST_WEEK_DAYS))
        .await?;

    Ok(Json(ListResponse {
        pagination: Pagination::new(&query, total),
        data,
        stats,
    }))
}

/// Mark contacted/converted, append a note or add a tag.
///
/// PATCH /api/admin/waitlist
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<WaitlistEntry>, ApiError> {
    let Json(request) = payload?;
    let request = request.trimmed();
    request.validate()?;

    let id = request.id;
    let update = request.into_update();
    if update.is_empty() {
        return Err(ApiError::validation("No changes supplied"));
    }

    let entry = state
        .waitlist
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Waitlist entry not found".to_string()))?;

    tracing::info!(admin_id = %admin.id, entry_id = %id, status = %entry.status(), "Waitlist entry updated");
    Ok(Json(entry))
}

/// DELETE /api/admin/waitlist?id=
pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Query(DeleteQuery { id }) = query?;

    if !state.waitlist.delete(id).await? {
        return Err(ApiError::NotFound("Waitlist entry not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, entry_id = %id, "Waitlist entry deleted");
    Ok(Json(SuccessResponse { success: true }))
}

/// Every entry as CSV, oldest first.
///
/// GET /api/admin/waitlist/export
pub async fn export(
    State(state): State<AppState>,
    AuthenticatedAdmin(admin): AuthenticatedAdmin,
) -> Result<Response, ApiError> {
    let entries = state.waitlist.export().await?;
    tracing::info!(admin_id = %admin.id, rows = entries.len(), "Waitlist exported");

    let filename = format!("waitlist-{}.csv", Utc::now().format("%Y-%m-%d"));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        to_csv(&entries),
    )
        .into_response())
}

const CSV_HEADER: [&str; 11] = [
    "id",
    "email",
    "name",
    "source",
    "interests",
    "tags",
    "notes",
    "contacted",
    "converted_to_customer",
    "status",
    "created_at",
];

fn to_csv(entries: &[WaitlistEntry]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push_str("\r\n");

    for entry in entries {
        let row = [
            entry.id.to_string(),
            entry.email.clone(),
            entry.name.clone(),
            entry.source.clone(),
            entry.interests.join(";"),
            entry.tags.join(";"),
            entry.notes.clone().unwrap_or_default(),
            entry.contacted.to_string(),
            entry.converted_to_customer.to_string(),
            entry.status().to_string(),
            entry.created_at.to_rfc3339(),
        ];
        let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }

    out
}

/// Quotes a field when needed and defuses spreadsheet formulas.
fn csv_field(value: &str) -> String {
    let value = if value.starts_with(['=', '+', '-', '@']) {
        format!("'{}", value)
    } else {
        value.to_string()
    };

    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

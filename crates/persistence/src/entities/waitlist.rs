//! Waitlist entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{StatusCounts, WaitlistStats};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the waitlist_entries table.
#[derive(Debug, Clone, FromRow)]
pub struct WaitlistEntryEntity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub source: String,
    pub interests: Vec<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub contacted: bool,
    pub converted_to_customer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WaitlistEntryEntity> for domain::models::WaitlistEntry {
    fn from(entity: WaitlistEntryEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            source: entity.source,
            interests: entity.interests,
            notes: entity.notes,
            tags: entity.tags,
            contacted: entity.contacted,
            converted_to_customer: entity.converted_to_customer,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Aggregate row produced by the waitlist stats query.
#[derive(Debug, Clone, FromRow)]
pub struct WaitlistStatsRow {
    pub total: i64,
    pub last_week: i64,
    pub pending: i64,
    pub contacted: i64,
    pub converted: i64,
}

impl From<WaitlistStatsRow> for WaitlistStats {
    fn from(row: WaitlistStatsRow) -> Self {
        Self {
            total: row.total,
            last_week: row.last_week,
            by_status: StatusCounts {
                pending: row.pending,
                contacted: row.contacted,
                converted: row.converted,
            },
        }
    }
}

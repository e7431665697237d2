//! Waitlist repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{
    NewWaitlistEntry, WaitlistEntry, WaitlistQuery, WaitlistStats, WaitlistUpdate,
};
use domain::services::{StoreError, WaitlistStore};
use shared::validation::normalize_email;
use sqlx::PgPool;
use uuid::Uuid;

use super::{escape_like, store_error};
use crate::entities::{WaitlistEntryEntity, WaitlistStatsRow};
use crate::metrics::QueryTimer;

/// Status expression matching `WaitlistStatus::derive`.
const STATUS_SQL: &str = "CASE WHEN converted_to_customer THEN 'converted' \
     WHEN contacted THEN 'contacted' ELSE 'pending' END";

/// Repository for waitlist entries.
#[derive(Clone)]
pub struct WaitlistRepository {
    pool: PgPool,
}

impl WaitlistRepository {
    /// Creates a new WaitlistRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `$1` is the status filter and `$2` the LIKE pattern; either may be NULL.
    fn filter_clause() -> String {
        format!(
            "($1::text IS NULL OR {} = $1) \
             AND ($2::text IS NULL OR LOWER(email) LIKE $2 OR LOWER(name) LIKE $2)",
            STATUS_SQL
        )
    }
}

#[async_trait::async_trait]
impl WaitlistStore for WaitlistRepository {
    async fn create(&self, entry: NewWaitlistEntry) -> Result<WaitlistEntry, StoreError> {
        let timer = QueryTimer::new("create_waitlist_entry");
        let result = sqlx::query_as::<_, WaitlistEntryEntity>(
            r#"
            INSERT INTO waitlist_entries (email, name, source, interests)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, source, interests, notes, tags, contacted,
                      converted_to_customer, created_at, updated_at
            "#,
        )
        .bind(normalize_email(&entry.email))
        .bind(&entry.name)
        .bind(&entry.source)
        .bind(&entry.interests)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(WaitlistEntry::from).map_err(store_error)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let timer = QueryTimer::new("count_waitlist_entries");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM waitlist_entries")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn stats(&self, since: DateTime<Utc>) -> Result<WaitlistStats, StoreError> {
        let timer = QueryTimer::new("waitlist_stats");
        let result = sqlx::query_as::<_, WaitlistStatsRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE created_at >= $1) AS last_week,
                COUNT(*) FILTER (WHERE NOT contacted AND NOT converted_to_customer) AS pending,
                COUNT(*) FILTER (WHERE contacted AND NOT converted_to_customer) AS contacted,
                COUNT(*) FILTER (WHERE converted_to_customer) AS converted
            FROM waitlist_entries
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(WaitlistStats::from).map_err(store_error)
    }

    async fn list(&self, query: &WaitlistQuery) -> Result<(Vec<WaitlistEntry>, i64), StoreError> {
        let status = query.status.map(|s| s.as_str().to_string());
        let pattern = query
            .search_term()
            .map(|term| format!("%{}%", escape_like(&term)));
        let filter = Self::filter_clause();

        let timer = QueryTimer::new("count_waitlist_entries_filtered");
        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM waitlist_entries WHERE {}",
            filter
        ))
        .bind(&status)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        let total = total.map_err(store_error)?;

        let timer = QueryTimer::new("list_waitlist_entries");
        let rows = sqlx::query_as::<_, WaitlistEntryEntity>(&format!(
            r#"
            SELECT id, email, name, source, interests, notes, tags, contacted,
                   converted_to_customer, created_at, updated_at
            FROM waitlist_entries
            WHERE {}
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            filter
        ))
        .bind(&status)
        .bind(&pattern)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let entries = rows
            .map_err(store_error)?
            .into_iter()
            .map(WaitlistEntry::from)
            .collect();
        Ok((entries, total))
    }

    async fn find(&self, id: Uuid) -> Result<Option<WaitlistEntry>, StoreError> {
        let timer = QueryTimer::new("find_waitlist_entry");
        let result = sqlx::query_as::<_, WaitlistEntryEntity>(
            r#"
            SELECT id, email, name, source, interests, notes, tags, contacted,
                   converted_to_customer, created_at, updated_at
            FROM waitlist_entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(WaitlistEntry::from))
    }

    async fn update(
        &self,
        id: Uuid,
        update: &WaitlistUpdate,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        let timer = QueryTimer::new("update_waitlist_entry");
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // Row lock so concurrent note/tag appends never lose each other.
        let current = sqlx::query_as::<_, WaitlistEntryEntity>(
            r#"
            SELECT id, email, name, source, interests, notes, tags, contacted,
                   converted_to_customer, created_at, updated_at
            FROM waitlist_entries
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?;

        let Some(current) = current else {
            timer.record();
            return Ok(None);
        };

        let mut entry = WaitlistEntry::from(current);
        update.apply(&mut entry, Utc::now());

        let updated = sqlx::query_as::<_, WaitlistEntryEntity>(
            r#"
            UPDATE waitlist_entries
            SET contacted = $1, converted_to_customer = $2, notes = $3, tags = $4, updated_at = $5
            WHERE id = $6
            RETURNING id, email, name, source, interests, notes, tags, contacted,
                      converted_to_customer, created_at, updated_at
            "#,
        )
        .bind(entry.contacted)
        .bind(entry.converted_to_customer)
        .bind(&entry.notes)
        .bind(&entry.tags)
        .bind(entry.updated_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        timer.record();
        Ok(Some(updated.into()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_waitlist_entry");
        let result = sqlx::query("DELETE FROM waitlist_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result.map_err(store_error)?.rows_affected() > 0)
    }

    async fn export(&self) -> Result<Vec<WaitlistEntry>, StoreError> {
        let timer = QueryTimer::new("export_waitlist_entries");
        let result = sqlx::query_as::<_, WaitlistEntryEntity>(
            r#"
            SELECT id, email, name, source, interests, notes, tags, contacted,
                   converted_to_customer, created_at, updated_at
            FROM waitlist_entries
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(WaitlistEntry::from)
            .collect())
    }
}

//! Admin session repository.
//!
//! Tokens never touch the database; every lookup goes through the SHA-256
//! digest of the presented token.

use chrono::{DateTime, Duration, Utc};
use domain::models::IssuedSession;
use domain::services::{SessionStore, StoreError};
use shared::crypto::{generate_session_token, sha256_hex};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::metrics::QueryTimer;

/// PostgreSQL-backed [`SessionStore`] over the `admin_sessions` table.
#[derive(Clone)]
pub struct AdminSessionRepository {
    pool: PgPool,
    ttl: Duration,
}

impl AdminSessionRepository {
    /// Creates a repository whose sessions live for `ttl`.
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait::async_trait]
impl SessionStore for AdminSessionRepository {
    async fn issue(&self, user_id: Uuid) -> Result<IssuedSession, StoreError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.ttl;

        let timer = QueryTimer::new("issue_admin_session");
        let result = sqlx::query(
            r#"
            INSERT INTO admin_sessions (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(sha256_hex(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map_err(store_error)?;

        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }

    async fn verify(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let timer = QueryTimer::new("verify_admin_session");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM admin_sessions
            WHERE token_hash = $1 AND expires_at >= $2
            "#,
        )
        .bind(sha256_hex(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn refresh(&self, token: &str) -> Result<Option<IssuedSession>, StoreError> {
        let now = Utc::now();
        let new_token = generate_session_token();
        let expires_at = now + self.ttl;

        let timer = QueryTimer::new("refresh_admin_session");
        let result = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"
            UPDATE admin_sessions
            SET token_hash = $1, expires_at = $2, updated_at = $3
            WHERE token_hash = $4 AND expires_at >= $3
            RETURNING user_id, expires_at
            "#,
        )
        .bind(sha256_hex(&new_token))
        .bind(expires_at)
        .bind(now)
        .bind(sha256_hex(token))
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .map(|(user_id, expires_at)| IssuedSession {
                token: new_token,
                user_id,
                expires_at,
            }))
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::new("revoke_admin_session");
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
            .bind(sha256_hex(token))
            .execute(&self.pool)
            .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("purge_expired_admin_sessions");
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result.map_err(store_error)?.rows_affected())
    }
}

//! User repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::{NewUser, RoleSet, User};
use domain::services::{StoreError, UserStore};
use shared::validation::normalize_email;
use sqlx::postgres::PgQueryResult;
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn require_row(id: Uuid, result: Result<PgQueryResult, sqlx::Error>) -> Result<(), StoreError> {
    if result.map_err(store_error)?.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("User {}", id)));
    }
    Ok(())
}

#[async_trait::async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, display_name, password_hash, email_verified, roles,
                   failed_login_attempts, last_login_at, created_at, updated_at
            FROM users
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, display_name, password_hash, email_verified, roles,
                   failed_login_attempts, last_login_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(User::from))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, display_name, password_hash, email_verified, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, display_name, password_hash, email_verified, roles,
                      failed_login_attempts, last_login_at, created_at, updated_at
            "#,
        )
        .bind(normalize_email(&user.email))
        .bind(user.display_name)
        .bind(user.password_hash)
        .bind(user.email_verified)
        .bind(user.roles.to_stored())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(User::from).map_err(store_error)
    }

    async fn record_login_success(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let timer = QueryTimer::new("record_login_success");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = $1, failed_login_attempts = 0, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        require_row(id, result)
    }

    async fn record_login_failure(&self, id: Uuid) -> Result<i32, StoreError> {
        let timer = QueryTimer::new("record_login_failure");
        let result = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING failed_login_attempts
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound(format!("User {}", id)))
    }

    async fn set_roles(&self, id: Uuid, roles: &RoleSet) -> Result<(), StoreError> {
        let timer = QueryTimer::new("set_user_roles");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET roles = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(roles.to_stored())
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        require_row(id, result)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::new("set_user_password_hash");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1, failed_login_attempts = 0, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        require_row(id, result)
    }
}

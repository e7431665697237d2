//! User account store.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::validation::normalize_email;

use super::StoreError;
use crate::models::{NewUser, RoleSet, User};

/// Lookup and bookkeeping for user accounts.
///
/// Emails are compared case-insensitively; callers may pass any casing.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a new account. Fails with [`StoreError::Conflict`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Stamps `last_login_at` and resets the failed-attempt counter.
    async fn record_login_success(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Increments the failed-attempt counter and returns its new value.
    async fn record_login_failure(&self, id: Uuid) -> Result<i32, StoreError>;

    /// Replaces the user's roles.
    async fn set_roles(&self, id: Uuid, roles: &RoleSet) -> Result<(), StoreError>;

    /// Replaces the password hash and clears any lockout.
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

/// In-memory user store for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    /// Whether every call fails with a backend error.
    pub simulate_failure: bool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every operation fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.simulate_failure {
            tracing::warn!("In-memory user store simulating failure");
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }

    async fn with_user<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut User) -> T + Send,
    ) -> Result<T, StoreError> {
        self.check_available()?;
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", id)))?;
        let result = f(user);
        user.updated_at = Utc::now();
        Ok(result)
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.check_available()?;

        let email = normalize_email(&user.email);
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("Email {} already registered", email)));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email,
            display_name: user.display_name,
            password_hash: user.password_hash,
            email_verified: user.email_verified,
            roles: user.roles,
            failed_login_attempts: 0,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn record_login_success(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.with_user(id, |u| {
            u.last_login_at = Some(at);
            u.failed_login_attempts = 0;
        })
        .await
    }

    async fn record_login_failure(&self, id: Uuid) -> Result<i32, StoreError> {
        self.with_user(id, |u| {
            u.failed_login_attempts += 1;
            u.failed_login_attempts
        })
        .await
    }

    async fn set_roles(&self, id: Uuid, roles: &RoleSet) -> Result<(), StoreError> {
        let roles = roles.clone();
        self.with_user(id, move |u| u.roles = roles).await
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let hash = password_hash.to_string();
        self.with_user(id, move |u| {
            u.password_hash = Some(hash);
            u.failed_login_attempts = 0;
        })
        .await
    }
}

//! Admin session store.
//!
//! One capability interface backs every admin-authenticated surface: the
//! login endpoint issues, the session check and the admin gate verify,
//! refresh rotates, logout revokes, and the cleanup job purges.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::crypto::{generate_session_token, sha256_hex};

use super::StoreError;
use crate::models::{AdminSession, IssuedSession};

/// Default lifetime of an admin session.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Issues, verifies, rotates and revokes opaque admin session tokens.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Mints a fresh token for `user_id`, valid for the store's ttl.
    async fn issue(&self, user_id: Uuid) -> Result<IssuedSession, StoreError>;

    /// Returns the owning user if the token exists and has not expired.
    ///
    /// Expired rows are left in place for the cleanup job.
    async fn verify(&self, token: &str) -> Result<Option<Uuid>, StoreError>;

    /// Replaces the token and expiry of a live session, keeping the same row.
    ///
    /// Returns `None` if the token is unknown or expired. The old token never
    /// verifies again.
    async fn refresh(&self, token: &str) -> Result<Option<IssuedSession>, StoreError>;

    /// Deletes the session. Unknown tokens are treated as already revoked.
    async fn revoke(&self, token: &str) -> Result<(), StoreError>;

    /// Deletes all expired sessions and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

/// In-memory session store for tests and local development.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, AdminSession>>>,
    ttl: Duration,
    /// Whether every call fails with a backend error.
    pub simulate_failure: bool,
}

impl InMemorySessionStore {
    /// Create a store whose sessions live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            simulate_failure: false,
        }
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
            tracing::warn!("In-memory session store simulating failure");
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }

    /// Number of rows held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Moves a session's expiry. Returns false if the token is unknown.
    pub async fn set_expiry(&self, token: &str, expires_at: DateTime<Utc>) -> bool {
        match self.sessions.write().await.get_mut(&sha256_hex(token)) {
            Some(session) => {
                session.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn issue(&self, user_id: Uuid) -> Result<IssuedSession, StoreError> {
        self.check_available()?;

        let token = generate_session_token();
        let now = Utc::now();
        let session = AdminSession {
            id: Uuid::new_v4(),
            user_id,
            token_hash: sha256_hex(&token),
            expires_at: now + self.ttl,
            created_at: now,
            updated_at: now,
        };
        let expires_at = session.expires_at;

        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session);

        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }

    async fn verify(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        self.check_available()?;

        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(&sha256_hex(token))
            .filter(|s| !s.is_expired_at(now))
            .map(|s| s.user_id))
    }

    async fn refresh(&self, token: &str) -> Result<Option<IssuedSession>, StoreError> {
        self.check_available()?;

        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let old_hash = sha256_hex(token);
        match sessions.get(&old_hash) {
            Some(s) if !s.is_expired_at(now) => {}
            _ => return Ok(None),
        }

        let Some(mut session) = sessions.remove(&old_hash) else {
            return Ok(None);
        };

        let new_token = generate_session_token();
        session.token_hash = sha256_hex(&new_token);
        session.expires_at = now + self.ttl;
        session.updated_at = now;

        let issued = IssuedSession {
            token: new_token,
            user_id: session.user_id,
            expires_at: session.expires_at,
        };
        sessions.insert(session.token_hash.clone(), session);

        Ok(Some(issued))
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.sessions.write().await.remove(&sha256_hex(token));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.check_available()?;

        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

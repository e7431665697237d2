//! Admin session records.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted admin session. Only the SHA-256 digest of the token is kept.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminSession {
    /// A session is expired once `expires_at` lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// The raw credential handed to the client when a session is issued or rotated.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

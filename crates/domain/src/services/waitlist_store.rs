//! Waitlist entry store.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::validation::normalize_email;

use super::StoreError;
use crate::models::{
    NewWaitlistEntry, WaitlistEntry, WaitlistQuery, WaitlistStats, WaitlistUpdate,
};

/// Persistence for waitlist signups and their admin follow-up state.
#[async_trait::async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Inserts a signup. Fails with [`StoreError::Conflict`] if the email is
    /// already on the list.
    async fn create(&self, entry: NewWaitlistEntry) -> Result<WaitlistEntry, StoreError>;

    /// Total number of entries.
    async fn count(&self) -> Result<i64, StoreError>;

    /// Totals, entries created at or after `since`, and per-status counts.
    async fn stats(&self, since: DateTime<Utc>) -> Result<WaitlistStats, StoreError>;

    /// One page of entries matching the query, newest first, with the total
    /// number of matches.
    async fn list(&self, query: &WaitlistQuery) -> Result<(Vec<WaitlistEntry>, i64), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<WaitlistEntry>, StoreError>;

    /// Applies an admin update. Returns `None` if the entry does not exist.
    async fn update(
        &self,
        id: Uuid,
        update: &WaitlistUpdate,
    ) -> Result<Option<WaitlistEntry>, StoreError>;

    /// Deletes an entry. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Every entry, oldest first.
    async fn export(&self) -> Result<Vec<WaitlistEntry>, StoreError>;
}

/// In-memory waitlist store for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWaitlistStore {
    entries: Arc<RwLock<HashMap<Uuid, WaitlistEntry>>>,
    /// Whether every call fails with a backend error.
    pub simulate_failure: bool,
}

impl InMemoryWaitlistStore {
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
            tracing::warn!("In-memory waitlist store simulating failure");
            return Err(StoreError::Backend("Simulated failure".to_string()));
        }
        Ok(())
    }

    /// Moves an entry's creation time. Returns false if the entry is unknown.
    pub async fn set_created_at(&self, id: Uuid, created_at: DateTime<Utc>) -> bool {
        match self.entries.write().await.get_mut(&id) {
            Some(entry) => {
                entry.created_at = created_at;
                true
            }
            None => false,
        }
    }

    async fn sorted(&self) -> Vec<WaitlistEntry> {
        let mut entries: Vec<WaitlistEntry> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        entries
    }
}

#[async_trait::async_trait]
impl WaitlistStore for InMemoryWaitlistStore {
    async fn create(&self, entry: NewWaitlistEntry) -> Result<WaitlistEntry, StoreError> {
        self.check_available()?;

        let email = normalize_email(&entry.email);
        let mut entries = self.entries.write().await;
        if entries.values().any(|e| e.email == email) {
            return Err(StoreError::Conflict(format!("Email {} already on waitlist", email)));
        }

        let now = Utc::now();
        let created = WaitlistEntry {
            id: Uuid::new_v4(),
            email,
            name: entry.name,
            source: entry.source,
            interests: entry.interests,
            notes: None,
            tags: Vec::new(),
            contacted: false,
            converted_to_customer: false,
            created_at: now,
            updated_at: now,
        };
        entries.insert(created.id, created.clone());
        Ok(created)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.check_available()?;
        Ok(self.entries.read().await.len() as i64)
    }

    async fn stats(&self, since: DateTime<Utc>) -> Result<WaitlistStats, StoreError> {
        self.check_available()?;

        let entries = self.entries.read().await;
        let mut stats = WaitlistStats::default();
        for entry in entries.values() {
            stats.total += 1;
            if entry.created_at >= since {
                stats.last_week += 1;
            }
            stats.by_status.record(entry.status());
        }
        Ok(stats)
    }

    async fn list(&self, query: &WaitlistQuery) -> Result<(Vec<WaitlistEntry>, i64), StoreError> {
        self.check_available()?;

        let mut matching: Vec<WaitlistEntry> = self
            .sorted()
            .await
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        matching.reverse();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn find(&self, id: Uuid) -> Result<Option<WaitlistEntry>, StoreError> {
        self.check_available()?;
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        update: &WaitlistUpdate,
    ) -> Result<Option<WaitlistEntry>, StoreError> {
        self.check_available()?;

        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(&id).map(|entry| {
            update.apply(entry, Utc::now());
            entry.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.entries.write().await.remove(&id).is_some())
    }

    async fn export(&self) -> Result<Vec<WaitlistEntry>, StoreError> {
        self.check_available()?;
        Ok(self.sorted().await)
    }
}

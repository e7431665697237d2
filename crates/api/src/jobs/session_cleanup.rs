//! Purges expired admin sessions.

use domain::services::SessionStore;
use std::sync::Arc;

use super::scheduler::{Job, JobFrequency};

pub struct SessionCleanupJob {
    sessions: Arc<dyn SessionStore>,
    interval_minutes: u64,
}

impl SessionCleanupJob {
    pub fn new(sessions: Arc<dyn SessionStore>, interval_minutes: u64) -> Self {
        Self {
            sessions,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    fn run_at_startup(&self) -> bool {
        true
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let purged = self.sessions.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired admin sessions");
        }
        metrics::counter!("admin_sessions_purged_total").increment(purged);
        Ok(())
    }
}

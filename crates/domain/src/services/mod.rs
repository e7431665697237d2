//! Store traits the API layer depends on.
//!
//! Each trait has a PostgreSQL implementation in the `persistence` crate and
//! an in-memory implementation here for tests and local development.

pub mod session_store;
pub mod user_store;
pub mod waitlist_store;

use thiserror::Error;

pub use session_store::{InMemorySessionStore, SessionStore};
pub use user_store::{InMemoryUserStore, UserStore};
pub use waitlist_store::{InMemoryWaitlistStore, WaitlistStore};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store failed (connection loss, bad query, ...).
    #[error("Store backend error: {0}")]
    Backend(String),
}

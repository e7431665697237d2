//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod user;
pub mod waitlist;

pub use user::UserEntity;
pub use waitlist::{WaitlistEntryEntity, WaitlistStatsRow};

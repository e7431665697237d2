//! Domain models for subtrack.

pub mod admin_session;
pub mod user;
pub mod waitlist;

pub use admin_session::{AdminSession, IssuedSession};
pub use user::{NewUser, RoleName, RoleSet, User};
pub use waitlist::{
    add_tag, append_note, normalize_interests, NewWaitlistEntry, StatusCounts, WaitlistEntry,
    WaitlistQuery, WaitlistStats, WaitlistStatus, WaitlistUpdate, DEFAULT_SOURCE,
};

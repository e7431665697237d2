//! HTTP route handlers.

pub mod admin_auth;
pub mod admin_waitlist;
pub mod frontend;
pub mod health;
pub mod waitlist;

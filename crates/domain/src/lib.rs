//! Domain layer for the subtrack backend.
//!
//! This crate contains:
//! - Domain models (User, RoleSet, AdminSession, WaitlistEntry)
//! - Store traits the API depends on, with in-memory implementations
//! - Store error types

pub mod models;
pub mod services;

//! Persistence layer for the subtrack backend.
//!
//! This crate contains:
//! - Database connection management
//! - SQL migrations (`src/migrations`)
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain store traits
//! - Query and pool metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

//! Shared utilities for the subtrack backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Session token generation and hashing
//! - Password hashing with Argon2id
//! - Input normalization and validation helpers

pub mod crypto;
pub mod password;
pub mod validation;

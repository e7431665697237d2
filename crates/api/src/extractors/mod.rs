//! Custom Axum extractors.

pub mod admin_session;

pub use admin_session::AuthenticatedAdmin;

//! Application services used by the route handlers.

pub mod admin_auth;
pub mod admin_bootstrap;
pub mod cookies;

pub use admin_auth::{AdminAuthError, AdminAuthService, AdminIdentity, AdminLogin};
pub use cookies::CookieHelper;

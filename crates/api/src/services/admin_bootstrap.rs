//! Admin bootstrap for initial setup.
//!
//! Ensures the configured bootstrap account exists and holds the admin role.
//! Runs on every startup and is idempotent.

use domain::models::{NewUser, RoleName, RoleSet};
use domain::services::{StoreError, UserStore};
use shared::password::{hash_password, PasswordError};
use shared::validation::normalize_email;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// What [`bootstrap_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No bootstrap email configured, or no password to create the account with.
    Skipped,
    Created,
    /// The account existed and was given the admin role and/or a password.
    Repaired,
    AlreadyAdmin,
}

/// Creates or repairs the bootstrap admin account.
///
/// An existing account keeps its other roles and its password; it only gains
/// the admin role, and a password if it has none.
pub async fn bootstrap_admin(
    users: &dyn UserStore,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let email = normalize_email(&config.bootstrap_email);
    if email.is_empty() {
        return Ok(BootstrapOutcome::Skipped);
    }

    if let Some(user) = users.find_by_email(&email).await? {
        let mut repaired = false;

        if !user.is_admin() {
            let mut roles = user.roles.clone();
            roles.insert(RoleName::Admin);
            users.set_roles(user.id, &roles).await?;
            repaired = true;
        }

        if user.password_hash.is_none() && !config.bootstrap_password.is_empty() {
            let hash = hash_password(&config.bootstrap_password)?;
            users.set_password_hash(user.id, &hash).await?;
            repaired = true;
        }

        if repaired {
            info!(user_id = %user.id, "Bootstrap admin account repaired");
            return Ok(BootstrapOutcome::Repaired);
        }
        return Ok(BootstrapOutcome::AlreadyAdmin);
    }

    if config.bootstrap_password.is_empty() {
        warn!(
            "SUBTRACK__ADMIN__BOOTSTRAP_EMAIL is set but SUBTRACK__ADMIN__BOOTSTRAP_PASSWORD is empty - skipping bootstrap"
        );
        return Ok(BootstrapOutcome::Skipped);
    }

    let password_hash = hash_password(&config.bootstrap_password)?;
    let display_name = Some(config.bootstrap_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let user = users
        .create(NewUser {
            email,
            display_name,
            password_hash: Some(password_hash),
            email_verified: true,
            roles: RoleSet::from_roles([RoleName::Admin]),
        })
        .await?;

    info!(email = %user.email, user_id = %user.id, "Bootstrap admin user created");
    warn!(
        "SECURITY: Remove SUBTRACK__ADMIN__BOOTSTRAP_PASSWORD from configuration after initial setup"
    );

    Ok(BootstrapOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::InMemoryUserStore;
    use shared::password::verify_password;

    fn config(email: &str, password: &str) -> AdminBootstrapConfig {
        AdminBootstrapConfig {
            bootstrap_email: email.to_string(),
            bootstrap_password: password.to_string(),
            bootstrap_name: "Owner".to_string(),
        }
    }

    #[tokio::test]
    async fn test_skips_without_email() {
        let store = InMemoryUserStore::new();
        let outcome = bootstrap_admin(&store, &config("", "secret-pass"))
            .await
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_skips_new_account_without_password() {
        let store = InMemoryUserStore::new();
        let outcome = bootstrap_admin(&store, &config("owner@example.com", ""))
            .await
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::Skipped);
        assert!(store
            .find_by_email("owner@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_creates_then_is_idempotent() {
        let store = InMemoryUserStore::new();
        let cfg = config("Owner@Example.com", "secret-pass");

        assert_eq!(
            bootstrap_admin(&store, &cfg).await.unwrap(),
            BootstrapOutcome::Created
        );
        assert_eq!(
            bootstrap_admin(&store, &cfg).await.unwrap(),
            BootstrapOutcome::AlreadyAdmin
        );

        let user = store
            .find_by_email("owner@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_admin());
        assert_eq!(user.display_name.as_deref(), Some("Owner"));
        assert!(verify_password("secret-pass", user.password_hash.as_deref().unwrap()).unwrap());
    }

    #[tokio::test]
    async fn test_grants_admin_to_existing_user() {
        let store = InMemoryUserStore::new();
        let existing = store
            .create(NewUser {
                email: "owner@example.com".to_string(),
                display_name: None,
                password_hash: None,
                email_verified: false,
                roles: RoleSet::from_roles([RoleName::User]),
            })
            .await
            .unwrap();

        let outcome = bootstrap_admin(&store, &config("owner@example.com", "secret-pass"))
            .await
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::Repaired);

        let user = store.find_by_id(existing.id).await.unwrap().unwrap();
        assert!(user.roles.contains(RoleName::Admin));
        assert!(user.roles.contains(RoleName::User));
        assert!(user.password_hash.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let store = InMemoryUserStore::failing();
        let err = bootstrap_admin(&store, &config("owner@example.com", "secret-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Store(_)));
    }
}

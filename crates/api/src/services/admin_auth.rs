//! Admin authentication.
//!
//! Password login for users holding an admin role, and resolution of an
//! admin session token back to the admin it belongs to.

use chrono::Utc;
use domain::models::{IssuedSession, User};
use domain::services::{SessionStore, StoreError, UserStore};
use serde::Serialize;
use shared::crypto::is_well_formed_token;
use shared::password::{dummy_verify, verify_password, PasswordError};
use shared::validation::normalize_email;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account issue: {0}")]
    AccountIssue(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<AdminAuthError> for ApiError {
    fn from(err: AdminAuthError) -> Self {
        match err {
            AdminAuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AdminAuthError::AccountIssue(msg) => ApiError::AccountIssue(msg),
            AdminAuthError::Store(e) => e.into(),
            AdminAuthError::Password(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// The public view of an authenticated admin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<&'static str>,
}

impl From<&User> for AdminIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name.clone(),
            roles: user.roles.names(),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct AdminLogin {
    pub user: AdminIdentity,
    pub session: IssuedSession,
}

#[derive(Clone)]
pub struct AdminAuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    max_failed_login_attempts: i32,
}

impl AdminAuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        max_failed_login_attempts: i32,
    ) -> Self {
        Self {
            users,
            sessions,
            max_failed_login_attempts,
        }
    }

    /// Verifies an email/password pair and opens a session for an admin.
    ///
    /// Unknown emails, wrong passwords and non-admin accounts all yield
    /// [`AdminAuthError::InvalidCredentials`]. The password is checked before
    /// the role so a non-admin with the right password learns nothing extra.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AdminLogin, AdminAuthError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            dummy_verify(password);
            debug!("Admin login for unknown email");
            return Err(AdminAuthError::InvalidCredentials);
        };

        let Some(password_hash) = user.password_hash.as_deref() else {
            warn!(user_id = %user.id, "Admin login for account without password");
            return Err(AdminAuthError::AccountIssue(
                "This account has no password set".to_string(),
            ));
        };

        if self.is_locked(&user) {
            warn!(
                user_id = %user.id,
                failed_attempts = user.failed_login_attempts,
                "Admin login for locked account"
            );
            return Err(AdminAuthError::AccountIssue(
                "This account is locked after too many failed login attempts".to_string(),
            ));
        }

        let verified = match verify_password(password, password_hash) {
            Ok(verified) => verified,
            Err(PasswordError::InvalidHashFormat) => {
                warn!(user_id = %user.id, "Stored password hash is not a valid PHC string");
                return Err(AdminAuthError::AccountIssue(
                    "This account's credentials need to be reset".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if !verified {
            let attempts = self.users.record_login_failure(user.id).await?;
            info!(user_id = %user.id, failed_attempts = attempts, "Admin login failed");
            return Err(AdminAuthError::InvalidCredentials);
        }

        if !user.is_admin() {
            info!(user_id = %user.id, "Login by non-admin user rejected");
            return Err(AdminAuthError::InvalidCredentials);
        }

        let session = self.sessions.issue(user.id).await?;
        self.users.record_login_success(user.id, Utc::now()).await?;

        info!(user_id = %user.id, "Admin logged in");
        Ok(AdminLogin {
            user: AdminIdentity::from(&user),
            session,
        })
    }

    fn is_locked(&self, user: &User) -> bool {
        self.max_failed_login_attempts > 0
            && user.failed_login_attempts >= self.max_failed_login_attempts
    }

    /// Resolves a session token to its admin.
    ///
    /// `None` when the token is malformed, unknown or expired, when the user
    /// no longer exists, or when the user has lost every admin role.
    pub async fn current_admin(
        &self,
        token: &str,
    ) -> Result<Option<AdminIdentity>, AdminAuthError> {
        if !is_well_formed_token(token) {
            return Ok(None);
        }

        let Some(user_id) = self.sessions.verify(token).await? else {
            return Ok(None);
        };

        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_admin() => Ok(Some(AdminIdentity::from(&user))),
            Some(user) => {
                info!(user_id = %user.id, "Session holder no longer has an admin role");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Rotates a live session's token and expiry.
    pub async fn refresh(&self, token: &str) -> Result<Option<IssuedSession>, AdminAuthError> {
        if !is_well_formed_token(token) {
            return Ok(None);
        }
        Ok(self.sessions.refresh(token).await?)
    }

    /// Ends a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AdminAuthError> {
        if !is_well_formed_token(token) {
            return Ok(());
        }
        Ok(self.sessions.revoke(token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::{NewUser, RoleName, RoleSet};
    use domain::services::{InMemorySessionStore, InMemoryUserStore};
    use serde_json::json;
    use shared::password::hash_password;

    const PASSWORD: &str = "correct horse battery";

    struct Fixture {
        users: InMemoryUserStore,
        sessions: InMemorySessionStore,
        service: AdminAuthService,
    }

    fn fixture_with(users: InMemoryUserStore, sessions: InMemorySessionStore) -> Fixture {
        let service = AdminAuthService::new(
            Arc::new(users.clone()),
            Arc::new(sessions.clone()),
            3,
        );
        Fixture {
            users,
            sessions,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(InMemoryUserStore::new(), InMemorySessionStore::default())
    }

    async fn create_user(store: &InMemoryUserStore, email: &str, roles: RoleSet) -> User {
        store
            .create(NewUser {
                email: email.to_string(),
                display_name: Some("Ada".to_string()),
                password_hash: Some(hash_password(PASSWORD).unwrap()),
                email_verified: true,
                roles,
            })
            .await
            .unwrap()
    }

    fn admin_roles() -> RoleSet {
        RoleSet::from_stored(&json!([{ "id": "2", "name": "admin" }]))
    }

    #[tokio::test]
    async fn test_admin_login_issues_session() {
        let f = fixture();
        let user = create_user(&f.users, "admin@example.com", admin_roles()).await;

        let login = f
            .service
            .authenticate("  ADMIN@example.com ", PASSWORD)
            .await
            .unwrap();

        assert_eq!(login.user.id, user.id);
        assert_eq!(login.user.roles, vec!["admin"]);
        assert_eq!(login.session.token.len(), 64);

        let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());

        let current = f.service.current_admin(&login.session.token).await.unwrap();
        assert_eq!(current.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let f = fixture();
        let err = f
            .service
            .authenticate("ghost@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_non_admin_with_correct_password_is_rejected() {
        let f = fixture();
        create_user(
            &f.users,
            "user@example.com",
            RoleSet::from_roles([RoleName::User]),
        )
        .await;

        let err = f
            .service
            .authenticate("user@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::InvalidCredentials));
        assert!(f.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_wrong_password_counts_failures_and_locks() {
        let f = fixture();
        let user = create_user(&f.users, "admin@example.com", admin_roles()).await;

        for _ in 0..3 {
            let err = f
                .service
                .authenticate("admin@example.com", "wrong")
                .await
                .unwrap_err();
            assert!(matches!(err, AdminAuthError::InvalidCredentials));
        }

        let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 3);

        let err = f
            .service
            .authenticate("admin@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::AccountIssue(_)));
    }

    #[tokio::test]
    async fn test_successful_login_resets_failures() {
        let f = fixture();
        let user = create_user(&f.users, "admin@example.com", admin_roles()).await;

        f.service
            .authenticate("admin@example.com", "wrong")
            .await
            .unwrap_err();
        f.service
            .authenticate("admin@example.com", PASSWORD)
            .await
            .unwrap();

        let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_account_without_password_is_account_issue() {
        let f = fixture();
        f.users
            .create(NewUser {
                email: "sso@example.com".to_string(),
                display_name: None,
                password_hash: None,
                email_verified: true,
                roles: admin_roles(),
            })
            .await
            .unwrap();

        let err = f
            .service
            .authenticate("sso@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::AccountIssue(_)));
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_account_issue() {
        let f = fixture();
        f.users
            .create(NewUser {
                email: "legacy@example.com".to_string(),
                display_name: None,
                password_hash: Some("plaintext-oops".to_string()),
                email_verified: true,
                roles: admin_roles(),
            })
            .await
            .unwrap();

        let err = f
            .service
            .authenticate("legacy@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::AccountIssue(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let f = fixture_with(InMemoryUserStore::failing(), InMemorySessionStore::default());
        let err = f
            .service
            .authenticate("admin@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminAuthError::Store(StoreError::Backend(_))));
        assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_current_admin_rejects_demoted_user() {
        let f = fixture();
        let user = create_user(&f.users, "admin@example.com", admin_roles()).await;
        let login = f
            .service
            .authenticate("admin@example.com", PASSWORD)
            .await
            .unwrap();

        f.users
            .set_roles(user.id, &RoleSet::from_roles([RoleName::User]))
            .await
            .unwrap();

        assert!(f
            .service
            .current_admin(&login.session.token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_current_admin_rejects_malformed_and_expired_tokens() {
        let f = fixture();
        create_user(&f.users, "admin@example.com", admin_roles()).await;
        let login = f
            .service
            .authenticate("admin@example.com", PASSWORD)
            .await
            .unwrap();

        assert!(f.service.current_admin("short").await.unwrap().is_none());

        f.sessions
            .set_expiry(&login.session.token, Utc::now() - Duration::seconds(1))
            .await;
        assert!(f
            .service
            .current_admin(&login.session.token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_refresh_and_logout() {
        let f = fixture();
        create_user(&f.users, "admin@example.com", admin_roles()).await;
        let login = f
            .service
            .authenticate("admin@example.com", PASSWORD)
            .await
            .unwrap();

        let rotated = f
            .service
            .refresh(&login.session.token)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(rotated.token, login.session.token);
        assert!(f
            .service
            .current_admin(&login.session.token)
            .await
            .unwrap()
            .is_none());

        f.service.logout(&rotated.token).await.unwrap();
        f.service.logout(&rotated.token).await.unwrap();
        assert!(f
            .service
            .current_admin(&rotated.token)
            .await
            .unwrap()
            .is_none());
    }
}

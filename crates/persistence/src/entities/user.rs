//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::RoleSet;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified: bool,
    /// Raw JSONB; may hold any of the historical role shapes.
    pub roles: Value,
    pub failed_login_attempts: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            display_name: entity.display_name,
            password_hash: entity.password_hash,
            email_verified: entity.email_verified,
            roles: RoleSet::from_stored(&entity.roles),
            failed_login_attempts: entity.failed_login_attempts,
            last_login_at: entity.last_login_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{RoleName, User};
    use serde_json::json;

    fn entity(roles: Value) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            display_name: None,
            password_hash: Some("hash".to_string()),
            email_verified: true,
            roles,
            failed_login_attempts: 2,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_roles_normalized_from_encoded_string() {
        let user: User = entity(json!(r#"[{"id":"2","name":"admin"}]"#)).into();
        assert!(user.roles.contains(RoleName::Admin));
        assert_eq!(user.failed_login_attempts, 2);
    }

    #[test]
    fn test_roles_normalized_from_array() {
        let user: User = entity(json!([{ "id": "1", "name": "user" }])).into();
        assert!(!user.is_admin());
    }
}

//! User accounts and role sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A named permission grouping attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleName {
    User,
    Admin,
    SuperAdmin,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::User => "user",
            RoleName::Admin => "admin",
            RoleName::SuperAdmin => "super-admin",
        }
    }

    /// Stable record id written alongside the name in the stored role list.
    pub fn record_id(&self) -> &'static str {
        match self {
            RoleName::User => "1",
            RoleName::Admin => "2",
            RoleName::SuperAdmin => "3",
        }
    }

    /// Whether this role grants access to the admin subsystem.
    pub fn grants_admin(&self) -> bool {
        matches!(self, RoleName::Admin | RoleName::SuperAdmin)
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(RoleName::User),
            "admin" => Ok(RoleName::Admin),
            "super-admin" | "super_admin" | "superadmin" => Ok(RoleName::SuperAdmin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The normalized, unordered set of roles held by a user.
///
/// Stored role data comes in several historical shapes: a JSON-encoded
/// string, an array of `{id, name}` records, a single record, or bare names.
/// [`RoleSet::from_stored`] accepts all of them; [`RoleSet::to_stored`]
/// always writes the array-of-records form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleName>);

impl RoleSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_roles<I: IntoIterator<Item = RoleName>>(roles: I) -> Self {
        Self(roles.into_iter().collect())
    }

    /// Parses whatever shape the `roles` column holds. Unknown names are dropped.
    pub fn from_stored(value: &Value) -> Self {
        let mut set = RoleSet::new();
        set.collect_from(value, 0);
        set
    }

    fn collect_from(&mut self, value: &Value, depth: u8) {
        // A JSON string may itself hold encoded JSON; one level of nesting is enough.
        match value {
            Value::Null => {}
            Value::String(s) => {
                if depth == 0 {
                    if let Ok(inner) = serde_json::from_str::<Value>(s) {
                        match inner {
                            Value::String(name) => self.insert_name(&name),
                            other => self.collect_from(&other, depth + 1),
                        }
                        return;
                    }
                }
                self.insert_name(s);
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Array(_) => {}
                        other => self.collect_from(other, depth + 1),
                    }
                }
            }
            Value::Object(map) => {
                if let Some(Value::String(name)) = map.get("name") {
                    self.insert_name(name);
                }
            }
            _ => {}
        }
    }

    fn insert_name(&mut self, name: &str) {
        match RoleName::from_str(name) {
            Ok(role) => {
                self.0.insert(role);
            }
            Err(_) => tracing::debug!(role = %name, "Ignoring unknown stored role"),
        }
    }

    /// Canonical stored representation: `[{"id":"2","name":"admin"}, ...]`.
    pub fn to_stored(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|r| json!({ "id": r.record_id(), "name": r.as_str() }))
                .collect(),
        )
    }

    pub fn insert(&mut self, role: RoleName) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: RoleName) -> bool {
        self.0.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.0.iter().any(RoleName::grants_admin)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(RoleName::as_str).collect()
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub email_verified: bool,
    pub roles: RoleSet,
    pub failed_login_attempts: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}

/// Input for creating a user account. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified: bool,
    pub roles: RoleSet,
}

/*
 * Responsibility
 * - Identity record as owned by the identity store
 * - NewIdentity: insert payload (password already hashed)
 * - IdentityPatch: 詳細更新 (active / last_access_at には触れない)
 */
use chrono::{DateTime, Utc};

use super::role::Role;

#[derive(Clone)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn is_active_admin(&self) -> bool {
        self.active && self.role == Role::Admin
    }
}

// password_hash is left out on purpose
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("active", &self.active)
            .finish()
    }
}

#[derive(Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Detail update. `None` keeps the stored hash / role.
#[derive(Clone)]
pub struct IdentityPatch {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

impl IdentityPatch {
    pub fn demotes_admin(&self) -> bool {
        self.role.is_some_and(|role| role != Role::Admin)
    }
}

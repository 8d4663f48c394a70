/*
 * Responsibility
 * - Closed set of roles (ADMIN / USER) and their wire names
 * - Pure role -> permission mapping used by handlers and services
 */
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[default]
    #[serde(rename = "USER")]
    User,
}

/// Coarse-grained capabilities granted by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ManageUsers,
    ReadOwnProfile,
    UpdateOwnProfile,
    ChangeOwnRole,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageUsers,
    Permission::ReadOwnProfile,
    Permission::UpdateOwnProfile,
    Permission::ChangeOwnRole,
];

const USER_PERMISSIONS: &[Permission] = &[Permission::ReadOwnProfile, Permission::UpdateOwnProfile];

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::User => "User",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::User => USER_PERMISSIONS,
        }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

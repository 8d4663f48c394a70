/*
 * Responsibility
 * - Users の request/response DTO (camelCase)
 * - validate(): 形式チェックのみ (重複などの業務ルールは UserService)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Identity, Role};
use crate::error::AppError;
use crate::services::users::{UserChanges, UserDraft};

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_FULL_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 15;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    // missing -> USER
    #[serde(default)]
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_common(&self.username, &self.email, &self.full_name, self.phone.as_deref())?;
        validate_password(&self.password)
    }

    pub fn into_draft(self) -> UserDraft {
        UserDraft {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            full_name: self.full_name.trim().to_string(),
            phone: normalize_phone(self.phone),
            role: self.role,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    // missing or empty -> keep current password
    pub password: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    // missing -> keep current role
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_common(&self.username, &self.email, &self.full_name, self.phone.as_deref())?;
        if let Some(password) = &self.password
            && !password.is_empty()
        {
            validate_password(password)?;
        }
        Ok(())
    }

    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            full_name: self.full_name.trim().to_string(),
            phone: normalize_phone(self.phone),
            role: self.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub role_description: &'static str,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl From<Identity> for UserResponse {
    fn from(u: Identity) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            phone: u.phone,
            role: u.role,
            role_description: u.role.description(),
            active: u.active,
            created_at: u.created_at,
            last_access_at: u.last_access_at,
        }
    }
}

fn validate_common(
    username: &str,
    email: &str,
    full_name: &str,
    phone: Option<&str>,
) -> Result<(), AppError> {
    let username = username.trim();
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::invalid_request(
            "INVALID_USERNAME",
            "username must be between 3 and 50 characters",
        ));
    }
    if !is_email(email.trim()) {
        return Err(AppError::invalid_request("INVALID_EMAIL", "email is not valid"));
    }

    let full_name = full_name.trim();
    if full_name.is_empty() || full_name.chars().count() > MAX_FULL_NAME_LEN {
        return Err(AppError::invalid_request(
            "INVALID_FULL_NAME",
            "fullName is required and must be at most 100 characters",
        ));
    }
    if let Some(phone) = phone
        && phone.trim().chars().count() > MAX_PHONE_LEN
    {
        return Err(AppError::invalid_request(
            "INVALID_PHONE",
            "phone must be at most 15 characters",
        ));
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid_request(
            "INVALID_PASSWORD",
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

// shape check only: one '@', non-empty local part, dotted domain, no whitespace
fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

/*
 * Responsibility
 * - /api/auth/... の request/response DTO (camelCase)
 */
use serde::{Deserialize, Serialize};

use crate::api::dto::users::UserResponse;
use crate::error::AppError;
use crate::services::auth::LoginOutcome;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// password is never printed
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::invalid_request("INVALID_USERNAME", "username is required"));
        }
        if self.password.is_empty() {
            return Err(AppError::invalid_request("INVALID_PASSWORD", "password is required"));
        }
        Ok(())
    }
}

/// Body of `validate-token` and `refresh-token`.
#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    // milliseconds
    pub expires_in: u64,
    pub user: UserResponse,
}

impl From<LoginOutcome> for AuthResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.token,
            token_type: "Bearer",
            expires_in: outcome.expires_in_ms,
            user: outcome.identity.into(),
        }
    }
}

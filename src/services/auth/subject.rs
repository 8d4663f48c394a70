use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::Identity;
use crate::error::AppError;
use crate::repos::UserStore;
use crate::services::auth::token_validator::TokenValidator;

/// Token -> live identity.
///
/// Shared by the authenticate stage, `validate-token` and `refresh-token`, so
/// all three agree on what "valid" means.
#[derive(Clone)]
pub struct SubjectResolver {
    validator: TokenValidator,
    users: Arc<dyn UserStore>,
}

impl SubjectResolver {
    pub fn new(validator: TokenValidator, users: Arc<dyn UserStore>) -> Self {
        Self { validator, users }
    }

    /// Token kinds first, then `SubjectNotFound`, then `AccountDisabled`.
    /// A store failure surfaces as `Internal`.
    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AppError> {
        let claims = self.validator.validate(token, now)?;

        let identity = self
            .users
            .find_by_username(claims.subject())
            .await?
            .filter(|identity| identity.username == claims.subject())
            .ok_or(AppError::SubjectNotFound)?;

        if !identity.active {
            return Err(AppError::AccountDisabled);
        }

        // the stored role wins; a changed role only shows up here
        if claims.role() != Some(identity.role) {
            debug!(username = %identity.username, role = %identity.role, "token role is stale");
        }

        Ok(identity)
    }
}

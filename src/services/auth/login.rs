/*
 * Responsibility
 * - login / validate-token / refresh-token のオーケストレーション
 * - 失敗理由の外部表現を揃える (存在しないユーザーとパスワード違いは同じ InvalidCredentials)
 */
use chrono::{DateTime, Utc};
use serde_json::Map;
use tracing::{debug, info};

use crate::domain::Identity;
use crate::error::AppError;
use crate::services::auth::password::PasswordService;
use crate::services::auth::subject::SubjectResolver;
use crate::services::auth::token_issuer::TokenIssuer;
use crate::services::users::UserService;

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in_ms: u64,
    pub identity: Identity,
}

#[derive(Clone)]
pub struct LoginService {
    users: UserService,
    passwords: PasswordService,
    issuer: TokenIssuer,
    resolver: SubjectResolver,
}

impl LoginService {
    pub fn new(
        users: UserService,
        passwords: PasswordService,
        issuer: TokenIssuer,
        resolver: SubjectResolver,
    ) -> Self {
        Self {
            users,
            passwords,
            issuer,
            resolver,
        }
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AppError> {
        let found = self.users.find_by_username(username).await?;
        let stored = found.as_ref().map(|identity| identity.password_hash.clone());

        // runs even when `found` is None (dummy hash)
        let matched = self.passwords.verify(password.to_string(), stored).await;

        let Some(identity) = found.filter(|_| matched) else {
            info!(username = %username, "login rejected");
            return Err(AppError::InvalidCredentials);
        };

        if !identity.active {
            info!(username = %username, "login rejected: account disabled");
            return Err(AppError::AccountDisabled);
        }

        self.issue_for(identity, now).await
    }

    pub async fn validate_token(&self, token: &str, now: DateTime<Utc>) -> bool {
        match self.resolver.resolve(token, now).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = ?e, "token rejected");
                false
            }
        }
    }

    /// New token for the same subject; the password is not re-verified.
    pub async fn refresh(&self, token: &str, now: DateTime<Utc>) -> Result<LoginOutcome, AppError> {
        let identity = self.resolver.resolve(token, now).await?;
        self.issue_for(identity, now).await
    }

    async fn issue_for(
        &self,
        mut identity: Identity,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AppError> {
        let issued = self
            .issuer
            .issue(&identity.username, identity.role, Map::new(), now)?;

        self.users.touch_last_access(&identity.username, now).await;
        identity.last_access_at = Some(now);

        info!(
            username = %identity.username,
            role = %identity.role,
            expires_at_ms = issued.claims.expires_at_ms(),
            "token issued"
        );

        Ok(LoginOutcome {
            token: issued.token,
            expires_in_ms: self.issuer.ttl_ms(),
            identity,
        })
    }
}

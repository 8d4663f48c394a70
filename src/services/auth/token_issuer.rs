use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::Role;
use crate::error::AppError;
use crate::services::auth::claims::Claims;
use crate::services::auth::jwt::JwtCodec;

/// Default token lifetime: 24h in milliseconds.
pub const DEFAULT_TTL_MS: u64 = 86_400_000;

#[derive(Debug, thiserror::Error)]
#[error("token ttl must be between 1 and {max} ms, got {value}")]
pub struct InvalidTtl {
    pub value: u64,
    pub max: u64,
}

/// Result of issuing a token. `claims` are what the token carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Clone, Debug)]
pub struct TokenIssuer {
    codec: Arc<JwtCodec>,
    ttl_ms: i64,
}

impl TokenIssuer {
    pub fn new(codec: Arc<JwtCodec>, ttl_ms: u64) -> Result<Self, InvalidTtl> {
        let max = i64::MAX as u64 / 2;
        if ttl_ms == 0 || ttl_ms > max {
            return Err(InvalidTtl { value: ttl_ms, max });
        }

        Ok(Self {
            codec,
            ttl_ms: ttl_ms as i64,
        })
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms as u64
    }

    /// Issue a token for `subject`.
    ///
    /// - `iat = now`, `exp = now + ttl` (epoch ms)
    /// - the role travels as the `role` extra claim
    /// - same inputs and `now` give the same token
    pub fn issue(
        &self,
        subject: &str,
        role: Role,
        mut extra: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let issued_at = now.timestamp_millis();
        let expires_at = issued_at.saturating_add(self.ttl_ms);

        extra.insert("role".to_string(), Value::from(role.as_str()));
        let claims = Claims::new(subject, issued_at, expires_at, extra);
        let token = self.codec.sign(&claims)?;

        Ok(IssuedToken { token, claims })
    }
}

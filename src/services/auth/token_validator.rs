use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::services::auth::claims::Claims;
use crate::services::auth::jwt::{JwtCodec, TokenError};

/// Pure function of (token, key, now). No I/O.
#[derive(Clone, Debug)]
pub struct TokenValidator {
    codec: Arc<JwtCodec>,
}

impl TokenValidator {
    pub fn new(codec: Arc<JwtCodec>) -> Self {
        Self { codec }
    }

    /// 1. structure -> `Malformed`
    /// 2. signature -> `SignatureInvalid`
    /// 3. `now >= exp` -> `Expired`
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.codec.decode(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

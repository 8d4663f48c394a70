/// Factory: build the token / password services from application `Config`.
use std::sync::Arc;

use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::jwt::JwtCodec;
use crate::services::auth::password::PasswordService;
use crate::services::auth::token_issuer::TokenIssuer;
use crate::services::auth::token_validator::TokenValidator;

pub struct AuthSettings<'a> {
    pub jwt_secret: &'a [u8],
    pub jwt_expiration_ms: u64,
    pub bcrypt_cost: u32,
}

impl<'a> From<&'a Config> for AuthSettings<'a> {
    fn from(config: &'a Config) -> Self {
        Self {
            jwt_secret: &config.jwt_secret,
            jwt_expiration_ms: config.jwt_expiration_ms,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthServices {
    pub passwords: PasswordService,
    pub issuer: TokenIssuer,
    pub validator: TokenValidator,
}

pub fn build_auth_services(settings: &AuthSettings<'_>) -> Result<AuthServices, AppError> {
    // one codec (one key) shared by issuer and validator
    let codec = Arc::new(JwtCodec::new(settings.jwt_secret));

    let issuer = TokenIssuer::new(codec.clone(), settings.jwt_expiration_ms).map_err(|e| {
        error!(error = %e, "invalid token lifetime");
        AppError::Internal
    })?;
    let passwords = PasswordService::new(settings.bcrypt_cost)?;

    Ok(AuthServices {
        passwords,
        issuer,
        validator: TokenValidator::new(codec),
    })
}

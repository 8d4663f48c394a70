/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, DATABASE_URL, CORS 許可, JWT / bcrypt 設定など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::services::auth::token_issuer::DEFAULT_TTL_MS;

// Development only. Production must set JWT_SECRET.
const DEV_JWT_SECRET_B64: &str = "404E635266556A586E3272357538782F413F4428472B4B6250645367566B5970";
const MIN_SECRET_BYTES: usize = 32;
const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Credentials for the administrator created at startup when none is active.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // None -> in-memory identity store (development only)
    pub database_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: Vec<u8>,
    pub jwt_expiration_ms: u64,
    pub bcrypt_cost: u32,

    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database", &self.database_url.as_ref().map(|_| "postgres"))
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_expiration_ms", &self.jwt_expiration_ms)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let database_url = var("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret_b64 = match var("JWT_SECRET") {
            Some(s) => s,
            None if app_env.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEV_JWT_SECRET_B64.to_string(),
        };
        let jwt_secret = STANDARD
            .decode(jwt_secret_b64.trim())
            .map_err(|_| ConfigError::Invalid("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_expiration_ms = match var("JWT_EXPIRATION_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid("JWT_EXPIRATION_MS"))?,
            None => DEFAULT_TTL_MS,
        };

        let bcrypt_cost = match var("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or(ConfigError::Invalid("BCRYPT_COST"))?,
            None => DEFAULT_BCRYPT_COST,
        };

        let bootstrap_admin = match (
            var("BOOTSTRAP_ADMIN_USERNAME"),
            var("BOOTSTRAP_ADMIN_EMAIL"),
            var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (None, None, None) => None,
            (Some(username), Some(email), Some(password)) => Some(BootstrapAdmin {
                username,
                email,
                password,
            }),
            (None, _, _) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
            (_, None, _) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_EMAIL")),
            (_, _, None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            cors_allowed_origins,
            jwt_secret,
            jwt_expiration_ms,
            bcrypt_cost,
            bootstrap_admin,
        })
    }
}

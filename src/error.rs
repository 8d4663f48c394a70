/*
 * Responsibility
 * - アプリ共通の AppError 定義 (認証 / 認可 / 業務ルール / 入力 / 内部)
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - TokenError / RepoError / PasswordError を統一的に変換
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::repos::error::RepoError;
use crate::services::auth::jwt::TokenError;
use crate::services::auth::password::PasswordError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    // unknown user and wrong password are deliberately the same variant
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("token is malformed")]
    TokenMalformed,
    #[error("token signature is invalid")]
    TokenSignatureInvalid,
    #[error("token has expired")]
    TokenExpired,
    #[error("token subject does not exist")]
    SubjectNotFound,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("authentication required")]
    Unauthenticated,
    #[error("insufficient role")]
    Forbidden,

    #[error("username already exists")]
    DuplicateUsername,
    #[error("email already exists")]
    DuplicateEmail,
    #[error("cannot remove the last active administrator")]
    LastAdminProtection,

    #[error("{code}: {message}")]
    InvalidRequest { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn invalid_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::TokenMalformed => "TOKEN_MALFORMED",
            AppError::TokenSignatureInvalid => "TOKEN_SIGNATURE_INVALID",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::SubjectNotFound => "SUBJECT_NOT_FOUND",
            AppError::AccountDisabled => "ACCOUNT_DISABLED",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::DuplicateUsername => "DUPLICATE_USERNAME",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::LastAdminProtection => "LAST_ADMIN_PROTECTION",
            AppError::InvalidRequest { code, .. } => code,
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenMalformed
            | AppError::TokenSignatureInvalid
            | AppError::TokenExpired
            | AppError::SubjectNotFound
            | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateUsername
            | AppError::DuplicateEmail
            | AppError::LastAdminProtection => StatusCode::CONFLICT,
            AppError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self {
            AppError::InvalidRequest { message, .. } => message.clone(),
            AppError::NotFound { resource } => format!("{resource} not found."),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut res = (status, Json(body)).into_response();
        if matches!(self, AppError::Unauthenticated) {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed => AppError::TokenMalformed,
            TokenError::SignatureInvalid => AppError::TokenSignatureInvalid,
            TokenError::Expired => AppError::TokenExpired,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict("email") => AppError::DuplicateEmail,
            RepoError::Conflict(_) => AppError::DuplicateUsername,
            RepoError::LastAdmin => AppError::LastAdminProtection,
            RepoError::Db(_) | RepoError::InvalidRow(_) => {
                error!(error = ?e, "identity store failure");
                AppError::Internal
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        error!(error = %e, "password hashing failure");
        AppError::Internal
    }
}

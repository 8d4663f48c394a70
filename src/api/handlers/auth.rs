/*
 * Responsibility
 * - /api/auth/... handler (public)
 * - login / register / validate-token / refresh-token
 */
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{
    api::dto::{
        auth::{AuthResponse, LoginRequest, TokenRequest, ValidateTokenResponse},
        users::{CreateUserRequest, UserResponse},
    },
    error::AppError,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()?;

    let outcome = state
        .login
        .login(req.username.trim(), &req.password, Utc::now())
        .await?;

    Ok(Json(outcome.into()))
}

/// Self-registration. The created account is always a USER.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()?;

    let identity = state.users.register(req.into_draft(), Utc::now()).await?;

    Ok((StatusCode::CREATED, Json(identity.into())))
}

pub async fn validate_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Json<ValidateTokenResponse> {
    let valid = state.login.validate_token(&req.token, Utc::now()).await;
    Json(ValidateTokenResponse { valid })
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let outcome = state.login.refresh(&req.token, Utc::now()).await?;
    Ok(Json(outcome.into()))
}

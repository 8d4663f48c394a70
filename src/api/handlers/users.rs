/*
 * Responsibility
 * - /api/users 系 handler
 * - ADMIN 専用の管理系と、認証済みなら誰でも使える /profile
 * - 認可は authorize stage 済み。handler では role の permission を再確認してから
 *   DTO validation -> UserService 呼び出し
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    api::{
        dto::users::{CreateUserRequest, UpdateUserRequest, UserResponse},
        extractors::CurrentUser,
    },
    error::AppError,
    domain::Permission,
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    current.require(Permission::ManageUsers)?;
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    current.require(Permission::ManageUsers)?;
    req.validate()?;

    let identity = state.users.create(req.into_draft(), Utc::now()).await?;

    Ok((StatusCode::CREATED, Json(identity.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    current.require(Permission::ManageUsers)?;
    let identity = state.users.get(user_id).await?;
    Ok(Json(identity.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    current.require(Permission::ManageUsers)?;
    req.validate()?;

    let identity = state.users.update(user_id, req.into_changes()).await?;
    Ok(Json(identity.into()))
}

/// Soft delete.
pub async fn deactivate_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    current.require(Permission::ManageUsers)?;
    state.users.deactivate(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reactivate_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    current.require(Permission::ManageUsers)?;
    state.users.reactivate(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_profile(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let ctx = current.require(Permission::ReadOwnProfile)?;
    let identity = state.users.profile(ctx).await?;
    Ok(Json(identity.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let ctx = current.require(Permission::UpdateOwnProfile)?;
    req.validate()?;

    let identity = state.users.update_profile(ctx, req.into_changes()).await?;
    Ok(Json(identity.into()))
}

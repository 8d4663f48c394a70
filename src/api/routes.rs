/*
 * Responsibility
 * - URL 構造を定義 (/, /api/auth/..., /api/users/...)
 * - 認証 / 認可は middleware::auth が Router 全体 (fallback 含む) に掛ける
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::api::handlers::{auth, root, users};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root::status))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/validate-token", post(auth::validate_token))
        .route("/api/auth/refresh-token", post(auth::refresh_token))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route(
            "/api/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
        .route("/api/users/{user_id}/reactivate", put(users::reactivate_user))
        .fallback(root::not_found)
}

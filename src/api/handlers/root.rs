/*
 * Responsibility
 * - GET / (public, 疎通用)
 * - fallback: 未定義ルートも JSON error body で返す
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::error::AppError;

pub async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": "ok",
        })),
    )
}

pub async fn not_found() -> AppError {
    AppError::not_found("route")
}

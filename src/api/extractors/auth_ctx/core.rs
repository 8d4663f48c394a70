use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::{AuthState, AuthenticatedContext, Permission};
use crate::error::AppError;
use crate::state::AppState;

/// Handler で AuthenticatedContext を受け取るための extractor
/// authenticate stage が AuthState を request.extensions() に insert 済みである前提
/// Authenticated でなければ 401 (WWW-Authenticate: Bearer)
pub struct CurrentUser(pub AuthenticatedContext);

impl FromRequestParts<AppState> for CurrentUser
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthState>()
            .and_then(AuthState::context)
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthenticated)
    }
}

impl CurrentUser {
    /// 403 unless the caller's role grants `permission`.
    pub fn require(&self, permission: Permission) -> Result<&AuthenticatedContext, AppError> {
        if self.0.role.has(permission) {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

//! Stage 2: `AuthState` + (method, path) -> allow, 401 or 403.
//!
//! The only place in the pipeline that rejects a request for auth reasons.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::domain::AuthState;
use crate::error::AppError;
use crate::services::auth::{Decision, Denial};
use crate::state::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req.extensions().get::<AuthState>();
    let role = auth.and_then(AuthState::role);

    let decision = state.policy.evaluate(req.method(), req.uri().path(), role);

    match decision {
        Decision::Allowed => Ok(next.run(req).await),
        Decision::Denied(Denial::Unauthenticated) => Err(AppError::Unauthenticated),
        Decision::Denied(Denial::Forbidden) => {
            tracing::warn!(
                subject = auth.and_then(AuthState::context).map(|c| c.subject.as_str()),
                method = %req.method(),
                path = %req.uri().path(),
                "access denied"
            );
            Err(AppError::Forbidden)
        }
    }
}

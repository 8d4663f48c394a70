//! Authentication / authorization pipeline.
//!
//! Stages run in this order for every routed request:
//! 1. `authenticate`: token -> `AuthState` (never rejects)
//! 2. `authorize`: `AccessPolicy` decision (401 / 403)

mod authenticate;
mod authorize;

use axum::{Router, middleware};
use tower::ServiceBuilder;

use crate::state::AppState;

pub use authenticate::authenticate;
pub use authorize::authorize;

/// Apply the pipeline to every route (and the fallback) already added to `router`.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    let pipeline = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn_with_state(state, authorize));

    router.layer(pipeline)
}

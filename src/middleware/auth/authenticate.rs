//! Stage 1: bearer token -> `AuthState` in request extensions.
//!
//! Never rejects. Every failure (missing header, bad token, unknown or
//! disabled subject, store outage) becomes `AuthState::Anonymous`; turning
//! that into 401/403 is the authorize stage's job.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::domain::{AuthState, AuthenticatedContext};
use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // an already established context is kept as is
    if matches!(req.extensions().get::<AuthState>(), Some(AuthState::Authenticated(_))) {
        return next.run(req).await;
    }

    let auth_state = if state.public_routes.matches(req.uri().path()) {
        AuthState::PublicAllowed
    } else {
        match bearer_token(req.headers()) {
            None => AuthState::Anonymous,
            Some(token) => resolve(&state, &token).await,
        }
    };

    // middleware → extractor / authorize への受け渡し
    req.extensions_mut().insert(auth_state);

    next.run(req).await
}

async fn resolve(state: &AppState, token: &str) -> AuthState {
    match state.resolver.resolve(token, Utc::now()).await {
        Ok(identity) => {
            AuthState::Authenticated(AuthenticatedContext::new(identity.username, identity.role))
        }
        Err(AppError::Internal) => {
            tracing::error!("identity lookup failed, treating request as anonymous");
            AuthState::Anonymous
        }
        Err(err) => {
            tracing::warn!(error = ?err, "access token verification failed");
            AuthState::Anonymous
        }
    }
}

/// `Authorization: Bearer <token>`; the scheme is case-sensitive.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{Router, http::HeaderValue, middleware, routing::get};
    use chrono::DateTime;
    use serde_json::Map;

    use super::*;
    use crate::domain::{Identity, IdentityPatch, NewIdentity, Role};
    use crate::repos::UserStore;
    use crate::repos::error::RepoResult;
    use crate::services::auth::{AuthSettings, build_auth_services};
    use crate::test_support::{PASSWORD, SECRET, app_with, send};

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_prefix_is_exact() {
        assert_eq!(bearer_token(&headers("Bearer abc")).as_deref(), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    async fn whoami(req: Request<Body>) -> String {
        match req.extensions().get::<AuthState>() {
            Some(AuthState::Authenticated(ctx)) => format!("{}:{}", ctx.subject, ctx.role),
            Some(AuthState::PublicAllowed) => "public".to_string(),
            Some(AuthState::Anonymous) => "anonymous".to_string(),
            None => "none".to_string(),
        }
    }

    async fn established_as_carol(mut req: Request<Body>, next: Next) -> Response {
        req.extensions_mut()
            .insert(AuthState::Authenticated(AuthenticatedContext::new("carol", Role::Admin)));
        next.run(req).await
    }

    // authenticate only, no authorize stage, so every outcome reaches the handler
    fn stage_router(state: AppState) -> Router<AppState> {
        Router::new()
            .route("/api/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state, authenticate))
    }

    fn request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/whoami");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn established_context_is_never_overwritten() {
        let app = app_with(&[("bob", Role::User)], 60_000).await;
        let bob = app
            .state
            .login
            .login("bob", PASSWORD, Utc::now())
            .await
            .unwrap()
            .token;

        let router = stage_router(app.state.clone())
            .layer(middleware::from_fn(established_as_carol))
            .with_state(app.state.clone());

        for token in [None, Some("garbage"), Some(bob.as_str())] {
            let res = send(&router, request(token)).await;
            assert_eq!(text(res).await, "carol:ADMIN", "{token:?}");
        }

        // without the earlier stage the same token resolves to bob
        let router = stage_router(app.state.clone()).with_state(app.state);
        assert_eq!(text(send(&router, request(Some(bob.as_str()))).await).await, "bob:USER");
    }

    // Answers every username lookup with the same identity, the way a
    // case-insensitive or collation-folding backend might.
    struct FoldingStore(Identity);

    #[async_trait]
    impl UserStore for FoldingStore {
        fn backend_name(&self) -> &'static str {
            "folding"
        }

        async fn find_by_username(&self, _username: &str) -> RepoResult<Option<Identity>> {
            Ok(Some(self.0.clone()))
        }

        async fn find_by_id(&self, _id: i64) -> RepoResult<Option<Identity>> {
            Ok(Some(self.0.clone()))
        }

        async fn exists_by_username(&self, _username: &str) -> RepoResult<bool> {
            Ok(true)
        }

        async fn exists_by_email(&self, _email: &str) -> RepoResult<bool> {
            Ok(true)
        }

        async fn list_active(&self) -> RepoResult<Vec<Identity>> {
            Ok(vec![self.0.clone()])
        }

        async fn count_active_admins(&self) -> RepoResult<i64> {
            Ok(0)
        }

        async fn insert(&self, _new: NewIdentity, _now: DateTime<Utc>) -> RepoResult<Identity> {
            Ok(self.0.clone())
        }

        async fn update_details(
            &self,
            _id: i64,
            _patch: &IdentityPatch,
        ) -> RepoResult<Option<Identity>> {
            Ok(None)
        }

        async fn deactivate(&self, _id: i64) -> RepoResult<Option<Identity>> {
            Ok(None)
        }

        async fn reactivate(&self, _id: i64) -> RepoResult<Option<Identity>> {
            Ok(None)
        }

        async fn touch_last_access(&self, _username: &str, _at: DateTime<Utc>) -> RepoResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn subject_must_equal_the_stored_username() {
        let bob = Identity {
            id: 1,
            username: "bob".into(),
            email: "bob@logitrack.test".into(),
            password_hash: "x".into(),
            full_name: "Bob".into(),
            phone: None,
            role: Role::User,
            active: true,
            created_at: Utc::now(),
            last_access_at: None,
        };
        let auth = build_auth_services(&AuthSettings {
            jwt_secret: SECRET,
            jwt_expiration_ms: 60_000,
            bcrypt_cost: 4,
        })
        .unwrap();
        let issuer = auth.issuer.clone();
        let state = AppState::new(Arc::new(FoldingStore(bob)), auth);
        let router = stage_router(state.clone()).with_state(state);

        let now = Utc::now();
        let folded = issuer.issue("BOB", Role::User, Map::new(), now).unwrap().token;
        let exact = issuer.issue("bob", Role::User, Map::new(), now).unwrap().token;

        assert_eq!(text(send(&router, request(Some(folded.as_str()))).await).await, "anonymous");
        assert_eq!(text(send(&router, request(Some(exact.as_str()))).await).await, "bob:USER");
    }
}

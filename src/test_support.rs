//! Shared fixtures for router-level tests: in-memory store, bcrypt cost 4,
//! fixed signing key.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use crate::app::build_router;
use crate::config::Config;
use crate::domain::{NewIdentity, Role};
use crate::repos::{InMemoryUserRepo, UserStore};
use crate::services::auth::password::PasswordService;
use crate::services::auth::{AuthSettings, build_auth_services};
use crate::state::AppState;

pub const SECRET: &[u8] = b"router-test-secret-router-test-s";
pub const PASSWORD: &str = "s3cret!";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryUserRepo>,
}

/// App over an in-memory store seeded with `users` (all with `PASSWORD`).
pub async fn app_with(users: &[(&str, Role)], ttl_ms: u64) -> TestApp {
    let store = Arc::new(InMemoryUserRepo::new());
    let hash = PasswordService::new(4).unwrap().hash(PASSWORD.into()).await.unwrap();

    for (username, role) in users {
        store
            .insert(
                NewIdentity {
                    username: username.to_string(),
                    email: format!("{username}@logitrack.test"),
                    password_hash: hash.clone(),
                    full_name: username.to_string(),
                    phone: None,
                    role: *role,
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let auth = build_auth_services(&AuthSettings {
        jwt_secret: SECRET,
        jwt_expiration_ms: ttl_ms,
        bcrypt_cost: 4,
    })
    .unwrap();
    let state = AppState::new(store.clone(), auth);
    let config = Config::from_lookup(|_| None).unwrap();

    TestApp {
        router: build_router(state.clone(), &config),
        state,
        store,
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.unwrap()
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub async fn login_token(router: &Router, username: &str) -> String {
    let res = send(
        router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "username": username, "password": PASSWORD })),
        ),
    )
    .await;
    body_json(res).await["token"].as_str().unwrap().to_string()
}

//! Router-level behaviour: public bypass, 401 vs 403, login / refresh flows.

use std::time::Duration;

use axum::http::{StatusCode, header};
use serde_json::json;

use crate::domain::Role;
use crate::test_support::{PASSWORD, app_with, body_json, json_request, login_token, send};

const TTL: u64 = 60_000;

#[tokio::test]
async fn root_is_public() {
    let app = app_with(&[], TTL).await;

    let res = send(&app.router, json_request("GET", "/", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");
}

#[tokio::test]
async fn public_path_ignores_garbage_authorization() {
    let app = app_with(&[("bob", Role::User)], TTL).await;

    let res = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            Some("!!not-a-token!!"),
            Some(json!({ "username": "bob", "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&app.router, json_request("GET", "/", Some("x.y.z"), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_401_with_challenge() {
    let app = app_with(&[], TTL).await;

    for (method, uri) in [
        ("GET", "/api/users"),
        ("GET", "/api/users/profile"),
        ("DELETE", "/api/users/1"),
        ("GET", "/api/deliveries"),
    ] {
        let res = send(&app.router, json_request(method, uri, None, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(body_json(res).await["error"]["code"], "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn invalid_tokens_are_401_never_500() {
    let app = app_with(&[("bob", Role::User)], TTL).await;
    let token = login_token(&app.router, "bob").await;
    let tampered = format!("{}x", &token[..token.len() - 1]);

    for bad in ["garbage", "a.b.c", tampered.as_str()] {
        let res = send(
            &app.router,
            json_request("GET", "/api/users/profile", Some(bad), None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{bad}");
    }
}

#[tokio::test]
async fn expired_token_is_401() {
    let app = app_with(&[("bob", Role::User)], 50).await;
    let token = login_token(&app.router, "bob").await;

    tokio::time::sleep(Duration::from_millis(60)).await;

    let res = send(
        &app.router,
        json_request("GET", "/api/users/profile", Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_role_on_admin_path_is_403() {
    let app = app_with(&[("alice", Role::Admin), ("bob", Role::User)], TTL).await;
    let token = login_token(&app.router, "bob").await;

    for (method, uri) in [
        ("GET", "/api/users"),
        ("GET", "/api/users/1"),
        ("DELETE", "/api/users/1"),
        ("PUT", "/api/users/1/reactivate"),
    ] {
        let res = send(&app.router, json_request(method, uri, Some(&token), None)).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{method} {uri}");
        assert!(res.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    let res = send(
        &app.router,
        json_request("GET", "/api/users/profile", Some(&token), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["username"], "bob");
}

#[tokio::test]
async fn deactivated_user_token_stops_working() {
    let app = app_with(&[("alice", Role::Admin), ("bob", Role::User)], TTL).await;
    let admin = login_token(&app.router, "alice").await;
    let bob = login_token(&app.router, "bob").await;
    let bob_id = app.state.users.get_by_username("bob").await.unwrap().id;

    let res = send(
        &app.router,
        json_request("DELETE", &format!("/api/users/{bob_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(&app.router, json_request("GET", "/api/users/profile", Some(&bob), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_get_identical_bodies() {
    let app = app_with(&[("bob", Role::User)], TTL).await;

    let wrong = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "wrong-password" })),
        ),
    )
    .await;
    let unknown = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": PASSWORD })),
        ),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let wrong = body_json(wrong).await;
    assert_eq!(wrong["error"]["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong, body_json(unknown).await);
}

#[tokio::test]
async fn login_response_shape() {
    let app = app_with(&[("alice", Role::Admin)], TTL).await;

    let res = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
    assert!(res.headers().contains_key("x-request-id"));

    let body = body_json(res).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], TTL);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "ADMIN");
    assert!(body["user"]["lastAccessAt"].is_string());
    assert!(body["user"].get("passwordHash").is_none());
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
}

#[tokio::test]
async fn validate_and_refresh_token() {
    let app = app_with(&[("bob", Role::User)], TTL).await;
    let token = login_token(&app.router, "bob").await;

    let res = send(
        &app.router,
        json_request("POST", "/api/auth/validate-token", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(body_json(res).await["valid"], true);

    let res = send(
        &app.router,
        json_request("POST", "/api/auth/validate-token", None, Some(json!({ "token": "nope" }))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["valid"], false);

    let res = send(
        &app.router,
        json_request("POST", "/api/auth/refresh-token", None, Some(json!({ "token": token }))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let refreshed = body_json(res).await["token"].as_str().unwrap().to_string();

    let res = send(
        &app.router,
        json_request("GET", "/api/users/profile", Some(&refreshed), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(
        &app.router,
        json_request("POST", "/api/auth/refresh-token", None, Some(json!({ "token": "a.b.c" }))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"]["code"], "TOKEN_MALFORMED");
}

#[tokio::test]
async fn register_always_creates_a_user() {
    let app = app_with(&[], TTL).await;

    let res = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "eve",
                "email": "eve@logitrack.test",
                "password": "s3cret!",
                "fullName": "Eve",
                "role": "ADMIN",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["role"], "USER");

    let res = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "eve",
                "email": "other@logitrack.test",
                "password": "s3cret!",
                "fullName": "Eve",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["error"]["code"], "DUPLICATE_USERNAME");
}

#[tokio::test]
async fn admin_manages_users() {
    let app = app_with(&[("alice", Role::Admin)], TTL).await;
    let admin = login_token(&app.router, "alice").await;

    let res = send(
        &app.router,
        json_request(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({
                "username": "carol",
                "email": "carol@logitrack.test",
                "password": "s3cret!",
                "fullName": "Carol",
                "role": "ADMIN",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let carol_id = body_json(res).await["id"].as_i64().unwrap();

    let res = send(&app.router, json_request("GET", "/api/users", Some(&admin), None)).await;
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 2);

    let res = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/users/{carol_id}"),
            Some(&admin),
            Some(json!({
                "username": "carol",
                "email": "carol@logitrack.test",
                "fullName": "Carol Danvers",
                "phone": "5550100",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["fullName"], "Carol Danvers");
    assert_eq!(body["role"], "ADMIN");

    let res = send(&app.router, json_request("GET", "/api/users/999", Some(&admin), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn last_admin_cannot_deactivate_themselves() {
    let app = app_with(&[("alice", Role::Admin)], TTL).await;
    let admin = login_token(&app.router, "alice").await;
    let alice_id = app.state.users.get_by_username("alice").await.unwrap().id;

    let res = send(
        &app.router,
        json_request("DELETE", &format!("/api/users/{alice_id}"), Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["error"]["code"], "LAST_ADMIN_PROTECTION");

    let res = send(
        &app.router,
        json_request("GET", "/api/users/profile", Some(&admin), None),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["active"], true);
}

#[tokio::test]
async fn profile_update_keeps_role_for_users() {
    let app = app_with(&[("bob", Role::User)], TTL).await;
    let token = login_token(&app.router, "bob").await;

    let res = send(
        &app.router,
        json_request(
            "PUT",
            "/api/users/profile",
            Some(&token),
            Some(json!({
                "username": "bob",
                "email": "bob@logitrack.test",
                "fullName": "Bob B.",
                "role": "ADMIN",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["role"], "USER");
    assert_eq!(body["fullName"], "Bob B.");
}

#[tokio::test]
async fn unknown_routes() {
    let app = app_with(&[("bob", Role::User)], TTL).await;
    let token = login_token(&app.router, "bob").await;

    let res = send(&app.router, json_request("GET", "/api/nothing-here", None, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app.router, json_request("GET", "/api/nothing-here", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn invalid_body_is_400() {
    let app = app_with(&[], TTL).await;

    let res = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "x",
                "email": "x@logitrack.test",
                "password": "s3cret!",
                "fullName": "X",
            })),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"]["code"], "INVALID_USERNAME");
}

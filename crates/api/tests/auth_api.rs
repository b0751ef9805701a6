//! HTTP-level integration tests for the auth endpoints.
//!
//! Tests cover registration, login, token refresh (rotation, replay,
//! device binding, the concurrent race), and logout.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, post_json, post_json_auth, post_json_no_meta, post_json_ua, register_user,
    TEST_UA,
};
use keygate_db::repositories::UserRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Successful registration returns 201 with a Bearer token pair.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_success(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = register_user(app, "a@a.com", "pw1").await;

    assert!(json["access_token"].is_string(), "response must contain access_token");
    assert!(json["refresh_token"].is_string(), "response must contain refresh_token");
    assert_eq!(json["token_type"], "Bearer");
}

/// Mismatched password confirmation returns 400.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_password_mismatch(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "email": "a@a.com",
        "password": "pw1",
        "re_password": "pw2",
    });
    let response = post_json(app, "/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Registering without a user agent or client IP returns 400.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_missing_device_info(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "email": "a@a.com",
        "password": "pw1",
        "re_password": "pw1",
    });
    let response = post_json_no_meta(app, "/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A malformed email address returns 422.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_invalid_email(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "email": "not-an-email",
        "password": "pw1",
        "re_password": "pw1",
    });
    let response = post_json(app, "/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// Registering an already-taken email returns 403. The duplicate is
/// caught by the unique index, not an application-level pre-check.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_register_duplicate_email(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register_user(app, "taken@test.com", "pw1").await;

    let app = common::build_test_app(pool);
    let body = serde_json::json!({
        "email": "taken@test.com",
        "password": "other",
        "re_password": "other",
    });
    let response = post_json(app, "/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Successful login returns 200 with a fresh token pair.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register_user(app, "login@test.com", "secret").await;

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "email": "login@test.com", "password": "secret" });
    let response = post_json(app, "/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
}

/// Login with an incorrect password returns 403 and leaves no device row.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register_user(app, "wrongpw@test.com", "secret").await;

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "wrongpw@test.com", "password": "incorrect" });
    let response = post_json(app, "/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Only the registration session exists; the failed login added nothing.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
        .fetch_one(&pool)
        .await
        .expect("device count query should succeed");
    assert_eq!(count, 1, "failed login must not create a device row");
}

/// Login is not gated on the active flag: a deactivated account still
/// gets a token pair, and the rejection lands at the access guard the
/// first time the pair is used.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_deactivated_account_fails_at_guard(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    register_user(app, "dormant@test.com", "pw1").await;

    let user = UserRepo::find_by_email(&pool, "dormant@test.com")
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert!(
        UserRepo::deactivate(&pool, user.id)
            .await
            .expect("deactivation should succeed"),
        "deactivate must report the updated row"
    );

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "dormant@test.com", "password": "pw1" });
    let response = post_json(app, "/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = body_json(response).await;

    let app = common::build_test_app(pool);
    let response =
        common::get_auth(app, "/users/me", tokens["access_token"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Login with an unknown email returns 404.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_unknown_email(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "email": "ghost@test.com", "password": "whatever" });
    let response = post_json(app, "/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// A valid refresh token yields a new pair with a different refresh
/// token, and the old one is dead afterwards (single-use rotation).
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_rotates_and_spends_old_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t1 = register_user(app, "rot@test.com", "pw1").await;
    let old_refresh = t1["refresh_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "refresh_token": old_refresh });
    let response = post_json(app, "/auth/refresh", body.clone()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let t2 = body_json(response).await;
    assert_ne!(
        t2["refresh_token"].as_str().unwrap(),
        old_refresh,
        "refresh token must rotate on use"
    );

    // Replaying the consumed token fails.
    let app = common::build_test_app(pool);
    let response = post_json(app, "/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Refreshing with a garbage token returns 401.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_with_invalid_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "refresh_token": "not-a-real-token" });
    let response = post_json(app, "/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Presenting an access token where a refresh token is expected returns
/// 401 (kind mismatch).
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_with_access_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let tokens = register_user(app, "kind@test.com", "pw1").await;
    let access_token = tokens["access_token"].as_str().unwrap();

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "refresh_token": access_token });
    let response = post_json(app, "/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Refreshing from a different user agent is a hijack signal: 401, and
/// the whole session lineage dies -- a retry from the original agent
/// also fails.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_device_binding(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let tokens = register_user(app, "bind@test.com", "pw1").await;
    let refresh_token = tokens["refresh_token"].as_str().unwrap();
    let body = serde_json::json!({ "refresh_token": refresh_token });

    let app = common::build_test_app(pool.clone());
    let response = post_json_ua(app, "/auth/refresh", body.clone(), "EvilAgent/6.6").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The session was destroyed, not just the attempt rejected.
    let app = common::build_test_app(pool);
    let response = post_json_ua(app, "/auth/refresh", body, TEST_UA).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// N concurrent refreshes of the same token yield exactly one success;
/// the conditional jti rotation serializes the race at the device row.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_concurrent_refresh_race(pool: PgPool) {
    const ATTEMPTS: usize = 5;

    let app = common::build_test_app(pool.clone());
    let tokens = register_user(app, "race@test.com", "pw1").await;
    let refresh_token = tokens["refresh_token"].as_str().unwrap().to_string();

    let mut handles = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let app = common::build_test_app(pool.clone());
        let token = refresh_token.clone();
        handles.push(tokio::spawn(async move {
            let body = serde_json::json!({ "refresh_token": token });
            post_json(app, "/auth/refresh", body).await.status()
        }));
    }

    let mut successes = 0;
    let mut unauthorized = 0;
    for handle in handles {
        match handle.await.expect("refresh task should not panic") {
            StatusCode::OK => successes += 1,
            StatusCode::UNAUTHORIZED => unauthorized += 1,
            other => panic!("unexpected status from concurrent refresh: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one concurrent refresh may win");
    assert_eq!(unauthorized, ATTEMPTS - 1);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

/// Logout succeeds once, then the same refresh token is spent.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_logout_then_replay(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let tokens = register_user(app, "out@test.com", "pw1").await;
    let access_token = tokens["access_token"].as_str().unwrap();
    let refresh_token = tokens["refresh_token"].as_str().unwrap();
    let body = serde_json::json!({ "refresh_token": refresh_token });

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/auth/logout", body.clone(), access_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Successfully logged out");

    // Second logout with the same token: nothing left to delete.
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/auth/logout", body.clone(), access_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // And the refresh token is dead too.
    let app = common::build_test_app(pool);
    let response = post_json(app, "/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Logout requires a valid access token.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_logout_requires_access_token(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let tokens = register_user(app, "noauth@test.com", "pw1").await;
    let refresh_token = tokens["refresh_token"].as_str().unwrap();

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app, "/auth/logout", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

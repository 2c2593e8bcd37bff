//! Sign-up, login and profile lookup against a real database, with the
//! auth provider mocked.

mod common;

use crate::common::{unique_email, TestHarness};
use axum::http::StatusCode;
use relief_core::domains::profiles::Profile;
use relief_core::kernel::test_dependencies::MockAuthProvider;
use relief_core::kernel::TestDependencies;
use serde_json::json;
use test_context::test_context;
use uuid::Uuid;

#[test_context(TestHarness)]
#[tokio::test]
async fn signup_creates_profile_and_session(ctx: &mut TestHarness) {
    let api = ctx.api();
    let email = unique_email("signup");

    let response = api
        .post(
            "/api/auth/signup",
            None,
            json!({
                "email": email,
                "password": "correct-horse",
                "full_name": "Ana Lima",
                "phone": "+55 11 5555-0000"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let user_id: Uuid = serde_json::from_value(response.body["user"]["id"].clone()).unwrap();
    let token = response.body["session"]["access_token"]
        .as_str()
        .expect("auto-confirmed sign-up returns a session")
        .to_string();

    let profile = Profile::find_by_id(user_id, &ctx.db_pool)
        .await
        .unwrap()
        .expect("profile row created");
    assert_eq!(profile.email, email);
    assert_eq!(profile.full_name.as_deref(), Some("Ana Lima"));

    let me = api.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], email);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_signup_is_rejected(ctx: &mut TestHarness) {
    let api = ctx.api();
    let body = json!({"email": unique_email("dup"), "password": "correct-horse"});

    let first = api.post("/api/auth/signup", None, body.clone()).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = api.post("/api/auth/signup", None, body).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_signup_awaiting_confirmation_keeps_first_profile() {
    let deps =
        TestDependencies::new().with_auth_provider(MockAuthProvider::requiring_confirmation());
    let ctx = TestHarness::with_deps(deps)
        .await
        .expect("Failed to create test harness");
    let api = ctx.api();
    let email = unique_email("confirm");
    let body = json!({"email": email, "password": "correct-horse", "full_name": "Cy"});

    let first = api.post("/api/auth/signup", None, body.clone()).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert!(first.body["session"].is_null());
    let first_id: Uuid = serde_json::from_value(first.body["user"]["id"].clone()).unwrap();

    let second = api.post("/api/auth/signup", None, body).await;
    assert_eq!(second.status, StatusCode::CREATED);
    assert!(second.body["session"].is_null());

    let profile = Profile::find_by_email(&email, &ctx.db_pool)
        .await
        .unwrap()
        .expect("profile from the first sign-up");
    assert_eq!(profile.id, first_id);
    assert_eq!(profile.full_name.as_deref(), Some("Cy"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn login_returns_session_and_keeps_profile(ctx: &mut TestHarness) {
    let api = ctx.api();
    let email = unique_email("login");

    api.post(
        "/api/auth/signup",
        None,
        json!({"email": email, "password": "correct-horse", "full_name": "Bo"}),
    )
    .await;

    let wrong = api
        .post(
            "/api/auth/login",
            None,
            json!({"email": email, "password": "wrong-horse"}),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let response = api
        .post(
            "/api/auth/login",
            None,
            json!({"email": email, "password": "correct-horse"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["token_type"], "bearer");

    let user_id: Uuid = serde_json::from_value(response.body["user"]["id"].clone()).unwrap();
    let profile = Profile::find_by_id(user_id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    // Login without a name must not erase the one given at sign-up
    assert_eq!(profile.full_name.as_deref(), Some("Bo"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn me_without_profile_is_not_found(ctx: &mut TestHarness) {
    let api = ctx.api();
    let token = ctx
        .deps
        .token_for(Uuid::new_v4(), "ghost@example.org", false);

    let response = api.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

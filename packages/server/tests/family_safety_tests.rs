//! Family links, last-seen location and safety check windows.

mod common;

use crate::common::{create_test_user, link_family, unique_email, TestHarness};
use axum::http::StatusCode;
use relief_core::domains::notifications::{kinds, Notification};
use relief_core::domains::profiles::{Profile, SafetyStatus};
use relief_core::kernel::channels;
use serde_json::json;
use test_context::test_context;

// =============================================================================
// Family links
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn add_family_member_links_both_ways(ctx: &mut TestHarness) {
    let ana = create_test_user(&ctx.db_pool, &ctx.deps, "Ana").await.unwrap();
    let bo = create_test_user(&ctx.db_pool, &ctx.deps, "Bo").await.unwrap();
    let api = ctx.api();

    let response = api
        .post(
            "/api/family",
            Some(&ana.token),
            json!({"email": bo.email.to_uppercase(), "relation": "sibling"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["relation"], "sibling");

    let ana_family = api.get("/api/family", Some(&ana.token)).await;
    assert_eq!(ana_family.status, StatusCode::OK);
    let members = ana_family.body.as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["member_id"], bo.id.to_string());
    assert_eq!(members[0]["full_name"], "Bo");

    let bo_family = api.get("/api/family", Some(&bo.token)).await;
    let members = bo_family.body.as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["member_id"], ana.id.to_string());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn add_family_member_rejects_unknown_and_self(ctx: &mut TestHarness) {
    let ana = create_test_user(&ctx.db_pool, &ctx.deps, "Ana").await.unwrap();
    let api = ctx.api();

    let unknown = api
        .post(
            "/api/family",
            Some(&ana.token),
            json!({"email": unique_email("nobody")}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let itself = api
        .post("/api/family", Some(&ana.token), json!({"email": ana.email}))
        .await;
    assert_eq!(itself.status, StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn remove_family_member_unlinks_both_ways(ctx: &mut TestHarness) {
    let ana = create_test_user(&ctx.db_pool, &ctx.deps, "Ana").await.unwrap();
    let bo = create_test_user(&ctx.db_pool, &ctx.deps, "Bo").await.unwrap();
    link_family(&ctx.db_pool, &ana, &bo).await.unwrap();
    let api = ctx.api();

    let path = format!("/api/family/{}", bo.id);
    let response = api.delete(&path, Some(&ana.token)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let bo_family = api.get("/api/family", Some(&bo.token)).await;
    assert!(bo_family.body.as_array().unwrap().is_empty());

    let again = api.delete(&path, Some(&ana.token)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Location
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn location_update_is_stored_and_shared_with_family(ctx: &mut TestHarness) {
    let ana = create_test_user(&ctx.db_pool, &ctx.deps, "Ana").await.unwrap();
    let bo = create_test_user(&ctx.db_pool, &ctx.deps, "Bo").await.unwrap();
    link_family(&ctx.db_pool, &ana, &bo).await.unwrap();
    let api = ctx.api();

    let response = api
        .post(
            "/api/location",
            Some(&ana.token),
            json!({"latitude": -23.55, "longitude": -46.63}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let profile = Profile::find_by_id(ana.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.last_latitude, Some(-23.55));
    assert_eq!(profile.last_longitude, Some(-46.63));
    assert!(profile.last_seen_at.is_some());

    let sent = ctx.deps.realtime.messages_for_user(bo.id);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event, channels::EVENT_LOCATION_UPDATED);
    assert_eq!(sent[0].payload["user_id"], ana.id.to_string());
}

// =============================================================================
// Safety checks
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn safety_check_round_trip(ctx: &mut TestHarness) {
    let parent = create_test_user(&ctx.db_pool, &ctx.deps, "Parent").await.unwrap();
    let child = create_test_user(&ctx.db_pool, &ctx.deps, "Child").await.unwrap();
    link_family(&ctx.db_pool, &parent, &child).await.unwrap();
    let api = ctx.api();

    // Start with no body: configured window
    let started = api
        .send(
            axum::http::Method::POST,
            &format!("/api/family/{}/safety-check", child.id),
            Some(&parent.token),
            None,
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.body["safety_status"], "pending");
    assert!(started.body["safety_check_expires_at"].is_string());

    assert!(ctx
        .deps
        .realtime
        .was_published(&channels::user(child.id), channels::EVENT_SAFETY_CHECK));
    let inbox = Notification::list_for_user(child.id, true, 10, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, kinds::SAFETY_CHECK);

    // Child answers
    let answered = api
        .post(
            "/api/safety-check/respond",
            Some(&child.token),
            json!({"status": "need_help"}),
        )
        .await;
    assert_eq!(answered.status, StatusCode::OK);
    assert_eq!(answered.body["safety_status"], "need_help");

    let parent_inbox = Notification::list_for_user(parent.id, false, 10, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(parent_inbox.len(), 1);
    assert_eq!(parent_inbox[0].kind, kinds::SAFETY_STATUS);
    assert_eq!(parent_inbox[0].title, "Child needs help");
    assert!(ctx
        .deps
        .realtime
        .was_published(&channels::user(parent.id), channels::EVENT_SAFETY_STATUS));

    // A second answer has no open window
    let again = api
        .post(
            "/api/safety-check/respond",
            Some(&child.token),
            json!({"status": "safe"}),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn safety_check_requires_family_link(ctx: &mut TestHarness) {
    let ana = create_test_user(&ctx.db_pool, &ctx.deps, "Ana").await.unwrap();
    let stranger = create_test_user(&ctx.db_pool, &ctx.deps, "Stranger").await.unwrap();
    let api = ctx.api();

    let response = api
        .post(
            &format!("/api/family/{}/safety-check", stranger.id),
            Some(&ana.token),
            json!({"minutes": 5}),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let profile = Profile::find_by_id(stranger.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert!(profile.safety_status().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn expired_window_cannot_be_answered_and_is_cleared(ctx: &mut TestHarness) {
    let parent = create_test_user(&ctx.db_pool, &ctx.deps, "Parent").await.unwrap();
    let child = create_test_user(&ctx.db_pool, &ctx.deps, "Child").await.unwrap();
    link_family(&ctx.db_pool, &parent, &child).await.unwrap();
    let api = ctx.api();

    let started = api
        .post(
            &format!("/api/family/{}/safety-check", child.id),
            Some(&parent.token),
            json!({"minutes": 1}),
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);

    // Let the window lapse
    sqlx::query(
        "UPDATE profiles SET safety_check_expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1",
    )
    .bind(child.id)
    .execute(&ctx.db_pool)
    .await
    .unwrap();

    let late = api
        .post(
            "/api/safety-check/respond",
            Some(&child.token),
            json!({"status": "safe"}),
        )
        .await;
    assert_eq!(late.status, StatusCode::CONFLICT);

    let cleanup = api
        .post("/api/safety-check/cleanup", Some(&parent.token), json!({}))
        .await;
    assert_eq!(cleanup.status, StatusCode::OK);
    assert!(cleanup.body["cleared"].is_u64());

    let profile = Profile::find_by_id(child.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.safety_status(), None);
    assert!(profile.safety_check_expires_at.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn restarting_a_check_reopens_the_window(ctx: &mut TestHarness) {
    let parent = create_test_user(&ctx.db_pool, &ctx.deps, "Parent").await.unwrap();
    let child = create_test_user(&ctx.db_pool, &ctx.deps, "Child").await.unwrap();
    link_family(&ctx.db_pool, &parent, &child).await.unwrap();
    let api = ctx.api();
    let path = format!("/api/family/{}/safety-check", child.id);

    api.post(&path, Some(&parent.token), json!({})).await;
    api.post(
        "/api/safety-check/respond",
        Some(&child.token),
        json!({"status": "safe"}),
    )
    .await;

    let restarted = api.post(&path, Some(&parent.token), json!({})).await;
    assert_eq!(restarted.status, StatusCode::OK);
    assert_eq!(restarted.body["safety_status"], "pending");

    let profile = Profile::find_by_id(child.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.safety_status(), Some(SafetyStatus::Pending));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn safety_check_survives_a_failed_inbox_write(ctx: &mut TestHarness) {
    let parent = create_test_user(&ctx.db_pool, &ctx.deps, "Parent").await.unwrap();
    let child = create_test_user(&ctx.db_pool, &ctx.deps, "Child").await.unwrap();
    link_family(&ctx.db_pool, &parent, &child).await.unwrap();

    // Reject inbox rows for this child only; other tests share the database
    let function = format!("reject_inbox_{}", child.id.simple());
    sqlx::query(&format!(
        "CREATE FUNCTION {function}() RETURNS trigger AS $$ \
         BEGIN \
           IF NEW.user_id = '{}' THEN RAISE EXCEPTION 'inbox unavailable'; END IF; \
           RETURN NEW; \
         END $$ LANGUAGE plpgsql",
        child.id
    ))
    .execute(&ctx.db_pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER {function} BEFORE INSERT ON notifications \
         FOR EACH ROW EXECUTE FUNCTION {function}()"
    ))
    .execute(&ctx.db_pool)
    .await
    .unwrap();

    let started = ctx
        .api()
        .post(
            &format!("/api/family/{}/safety-check", child.id),
            Some(&parent.token),
            json!({}),
        )
        .await;

    sqlx::query(&format!("DROP TRIGGER {function} ON notifications"))
        .execute(&ctx.db_pool)
        .await
        .unwrap();
    sqlx::query(&format!("DROP FUNCTION {function}()"))
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.body["safety_status"], "pending");
    assert!(ctx
        .deps
        .realtime
        .was_published(&channels::user(child.id), channels::EVENT_SAFETY_CHECK));

    let inbox = Notification::list_for_user(child.id, false, 10, &ctx.db_pool)
        .await
        .unwrap();
    assert!(inbox.is_empty());

    let profile = Profile::find_by_id(child.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.safety_status(), Some(SafetyStatus::Pending));
}

//! Integration tests for connboard API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Submission status codes (accepted, ignored, parse error, duplicate,
//!   closed month)
//! - Current and historical leaderboards
//! - Winner lookup, including archived periods
//! - Community registration

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{FixedOffset, TimeZone};
use connboard::{build_router, AppState};
use connboard_common::db::init::init_database;
use connboard_common::store::{MemoryStore, SqliteStore};
use connboard_common::time::ManualClock;
use connboard_common::{LeaderboardService, LeaderboardStore, RotationPeriod, ScoreEntry};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const PERFECT: &str = "Connections\nPuzzle #412\n🟨🟨🟨🟨\n🟩🟩🟩🟩\n🟦🟦🟦🟦\n🟪🟪🟪🟪";
const SIX_ROWS: &str =
    "Connections\nPuzzle #412\n🟨🟩🟨🟨\n🟨🟨🟨🟨\n🟩🟦🟩🟩\n🟩🟩🟩🟩\n🟦🟦🟦🟦\n🟪🟪🟪🟪";

struct TestApp {
    router: axum::Router,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

/// Test helper: app on an in-memory store with the clock at 2024-06-15 noon
fn setup_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .unwrap(),
    ));
    let service = LeaderboardService::new(store.clone(), clock.clone());
    let router = build_router(AppState::new(service, store.clone(), None));
    TestApp {
        router,
        store,
        clock,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn submission(user_id: &str, text: &str) -> Request<Body> {
    post_json(
        "/api/communities/guild/submissions",
        json!({ "user_id": user_id, "text": text }),
    )
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app();

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "connboard");
    assert!(body["version"].is_string());
}

// =============================================================================
// Submissions
// =============================================================================

#[tokio::test]
async fn test_submission_accepted() {
    let app = setup_app();

    let response = app.router.oneshot(submission("111", PERFECT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 8);
    assert_eq!(body["total"], 8);
    assert_eq!(body["reply"], "You earned 8 points today!\nTotal score: 8");
}

#[tokio::test]
async fn test_non_submission_ignored() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(submission("111", "anyone up for lunch?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_invalid_symbol_rejected_with_reply() {
    let app = setup_app();

    let text = "Connections\nPuzzle #412\n🟨🟨🟨🟥\n🟩🟩🟩🟩\n🟦🟦🟦🟦\n🟪🟪🟪🟪";
    let response = app.router.oneshot(submission("111", text)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reply"], "Error: Invalid emoji: 🟥");
}

#[tokio::test]
async fn test_duplicate_same_day_conflict() {
    let app = setup_app();

    let first = app
        .router
        .clone()
        .oneshot(submission("111", PERFECT))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .oneshot(submission("111", SIX_ROWS))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = extract_json(second.into_body()).await;
    assert_eq!(body["reply"], "You have already submitted a score today.");
}

#[tokio::test]
async fn test_next_day_accumulates() {
    let app = setup_app();

    app.router
        .clone()
        .oneshot(submission("111", PERFECT))
        .await
        .unwrap();
    app.clock.advance(chrono::Duration::days(1));

    let response = app.router.oneshot(submission("111", SIX_ROWS)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 6);
    assert_eq!(body["total"], 14);
}

#[tokio::test]
async fn test_empty_user_rejected() {
    let app = setup_app();

    let response = app.router.oneshot(submission("  ", PERFECT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_after_month_closed_conflict() {
    let app = setup_app();
    let june = RotationPeriod::new(2024, 6).unwrap();

    app.router
        .clone()
        .oneshot(submission("42", PERFECT))
        .await
        .unwrap();
    app.store
        .archive_period("guild", june, Some(&ScoreEntry::new("42", 8)))
        .await
        .unwrap();
    app.clock.advance(chrono::Duration::days(1));

    let response = app
        .router
        .clone()
        .oneshot(submission("7", SIX_ROWS))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["reply"], "This month's leaderboard has already closed.");

    let response = app
        .router
        .oneshot(get("/api/communities/guild/leaderboard/2024/6"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["user_id"], "42");
}

// =============================================================================
// Leaderboards
// =============================================================================

#[tokio::test]
async fn test_empty_leaderboard() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(get("/api/communities/guild/leaderboard"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["text"], "No scores recorded this month yet!");
    assert_eq!(body["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_leaderboard_ranks_with_ties() {
    let app = setup_app();

    for (user, text) in [("1", PERFECT), ("2", SIX_ROWS), ("3", PERFECT)] {
        let response = app
            .router
            .clone()
            .oneshot(submission(user, text))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .oneshot(get("/api/communities/guild/leaderboard"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(
        body["text"],
        "Connections Leaderboard (This Month):\n1. <@1>: 8\n1. <@3>: 8\n3. <@2>: 6\n"
    );
    let ranks: Vec<i64> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["rank"].as_i64().unwrap())
        .collect();
    assert_eq!(ranks, vec![1, 1, 3]);
}

#[tokio::test]
async fn test_invalid_period_rejected() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(get("/api/communities/guild/leaderboard/2024/13"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Winner
// =============================================================================

#[tokio::test]
async fn test_winner_not_found_for_empty_period() {
    let app = setup_app();

    let response = app
        .router
        .oneshot(get("/api/communities/guild/winner/2024/5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_winner_of_open_and_archived_period() {
    let app = setup_app();
    let june = RotationPeriod::new(2024, 6).unwrap();

    app.router
        .clone()
        .oneshot(submission("42", PERFECT))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/api/communities/guild/winner/2024/6"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["user_id"], "42");
    assert_eq!(body["archived"], false);

    app.store
        .archive_period("guild", june, Some(&ScoreEntry::new("42", 8)))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get("/api/communities/guild/winner/2024/6"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 8);
    assert_eq!(body["archived"], true);
}

// =============================================================================
// Communities
// =============================================================================

#[tokio::test]
async fn test_register_community_is_idempotent() {
    let app = setup_app();

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/api/communities/newguild", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["community_id"], "newguild");
        assert!(body["announcement_destination"].is_null());
    }
}

#[tokio::test]
async fn test_sqlite_backed_app_persists_submissions() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("connboard.db"))
        .await
        .unwrap();
    let store = Arc::new(SqliteStore::new(pool));
    let clock = Arc::new(ManualClock::new(
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .unwrap(),
    ));
    let service = LeaderboardService::new(store.clone(), clock);
    let router = build_router(AppState::new(service, store.clone(), None));

    let response = router.oneshot(submission("7", SIX_ROWS)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let standings = store
        .standings("guild", RotationPeriod::new(2024, 6).unwrap())
        .await
        .unwrap();
    assert_eq!(standings, vec![ScoreEntry::new("7", 6)]);
}

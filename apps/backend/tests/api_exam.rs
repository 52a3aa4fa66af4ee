//! Exam API tests.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tutor_core::types::Level;

use common::TestContext;

#[tokio::test]
async fn test_exam_starts_in_setup() {
    let ctx = TestContext::new();
    let body: Value = ctx.server().get("/api/exam").await.json();
    assert_eq!(body["state"], "setup");
    assert_eq!(body["questions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_start_hides_answer_key_while_playing() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.post("/api/exam/start").json(&json!({ "level": 3 })).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["state"], "playing");
    assert_eq!(body["level"], 3);
    assert_eq!(body["remaining_secs"], 30);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 4);
    assert!(questions.iter().all(|q| q.get("correct_answer").is_none()));
    assert!(questions.iter().all(|q| q.get("explanation").is_none()));
    assert_eq!(ctx.provider.calls(), 1);
}

#[tokio::test]
async fn test_start_while_playing_conflicts() {
    let ctx = TestContext::new();
    let server = ctx.server();
    server.post("/api/exam/start").json(&json!({ "level": 1 })).await;

    let response = server.post("/api/exam/start").json(&json!({ "level": 1 })).await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_fetch_once() {
    let ctx = TestContext::new();
    ctx.provider.set_delay(Duration::from_millis(200));
    let level = Level::new(2).unwrap();

    let (first, second) = tokio::join!(ctx.state.exam.start(level), ctx.state.exam.start(level));
    assert!(first.is_ok());
    assert!(second.is_err());
    assert_eq!(ctx.provider.calls(), 1);

    let body: Value = ctx.server().get("/api/exam").await.json();
    assert_eq!(body["state"], "playing");
}

#[tokio::test]
async fn test_start_with_invalid_level_is_rejected() {
    let ctx = TestContext::new();
    let response = ctx
        .server()
        .post("/api/exam/start")
        .json(&json!({ "level": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.provider.calls(), 0);
}

#[tokio::test]
async fn test_failed_start_stays_in_setup() {
    let ctx = TestContext::new();
    let server = ctx.server();
    ctx.provider.set_failing(true);

    let response = server.post("/api/exam/start").json(&json!({ "level": 2 })).await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let body: Value = server.get("/api/exam").await.json();
    assert_eq!(body["state"], "setup");
}

#[tokio::test]
async fn test_answers_are_validated() {
    let ctx = TestContext::new();
    let server = ctx.server();
    server.post("/api/exam/start").json(&json!({ "level": 2 })).await;

    server
        .post("/api/exam/answer")
        .json(&json!({ "index": 0, "choice": "E" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/exam/answer")
        .json(&json!({ "index": 9, "choice": "A" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let body: Value = server
        .post("/api/exam/answer")
        .json(&json!({ "index": 1, "choice": "C" }))
        .await
        .json();
    assert_eq!(body["answers"][1], "C");

    let body: Value = server
        .post("/api/exam/answer")
        .json(&json!({ "index": 1, "choice": null }))
        .await
        .json();
    assert!(body["answers"][1].is_null());
}

#[tokio::test]
async fn test_navigation_moves_cursor() {
    let ctx = TestContext::new();
    let server = ctx.server();
    server.post("/api/exam/start").json(&json!({ "level": 2 })).await;

    let body: Value = server
        .post("/api/exam/navigate")
        .json(&json!({ "direction": "previous" }))
        .await
        .json();
    assert_eq!(body["cursor"], 0);

    let body: Value = server
        .post("/api/exam/navigate")
        .json(&json!({ "direction": "next" }))
        .await
        .json();
    assert_eq!(body["cursor"], 1);

    let body: Value = server
        .post("/api/exam/navigate")
        .json(&json!({ "direction": "to", "index": 3 }))
        .await
        .json();
    assert_eq!(body["cursor"], 3);

    let body: Value = server
        .post("/api/exam/navigate")
        .json(&json!({ "direction": "next" }))
        .await
        .json();
    assert_eq!(body["cursor"], 3);

    server
        .post("/api/exam/navigate")
        .json(&json!({ "direction": "to", "index": 4 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_asks_for_confirmation_then_scores() {
    let ctx = TestContext::new();
    let server = ctx.server();
    server.post("/api/exam/start").json(&json!({ "level": 4 })).await;

    server
        .post("/api/exam/answer")
        .json(&json!({ "index": 0, "choice": "A" }))
        .await
        .assert_status_ok();
    server
        .post("/api/exam/answer")
        .json(&json!({ "index": 1, "choice": "B" }))
        .await
        .assert_status_ok();

    let body: Value = server
        .post("/api/exam/submit")
        .json(&json!({ "confirm": false }))
        .await
        .json();
    assert_eq!(body["status"], "needs_confirmation");
    assert_eq!(body["unanswered"], 2);

    let body: Value = server
        .post("/api/exam/submit")
        .json(&json!({ "confirm": true }))
        .await
        .json();
    assert_eq!(body["status"], "finished");
    assert_eq!(body["result"]["score"], 1);
    assert_eq!(body["result"]["total"], 4);
    assert_eq!(body["result"]["reason"], "submitted");

    let snapshot: Value = server.get("/api/exam").await.json();
    assert_eq!(snapshot["state"], "finished");
    assert_eq!(snapshot["questions"][0]["correct_answer"], "A");

    server
        .post("/api/exam/answer")
        .json(&json!({ "index": 2, "choice": "A" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let history: Value = server.get("/api/exam/history").await.json();
    assert_eq!(history["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reset_only_after_finish() {
    let ctx = TestContext::new();
    let server = ctx.server();
    server.post("/api/exam/start").json(&json!({ "level": 5 })).await;

    server
        .post("/api/exam/reset")
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .post("/api/exam/submit")
        .json(&json!({ "confirm": true }))
        .await
        .assert_status_ok();
    server
        .post("/api/exam/reset")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let body: Value = server.get("/api/exam").await.json();
    assert_eq!(body["state"], "setup");
}

#[tokio::test(start_paused = true)]
async fn test_timer_finishes_exam() {
    let ctx = TestContext::new();
    let server = ctx.server();
    server.post("/api/exam/start").json(&json!({ "level": 1 })).await;
    server
        .post("/api/exam/answer")
        .json(&json!({ "index": 3, "choice": "A" }))
        .await
        .assert_status_ok();

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    let body: Value = server.get("/api/exam").await.json();
    assert_eq!(body["state"], "playing");
    assert_eq!(body["remaining_secs"], 20);

    tokio::time::sleep(Duration::from_secs(21)).await;
    let body: Value = server.get("/api/exam").await.json();
    assert_eq!(body["state"], "finished");
    assert_eq!(body["remaining_secs"], 0);
    assert_eq!(body["result"]["reason"], "timeout");
    assert_eq!(body["result"]["score"], 1);

    let history: Value = server.get("/api/exam/history").await.json();
    assert_eq!(history["results"].as_array().unwrap().len(), 1);
}

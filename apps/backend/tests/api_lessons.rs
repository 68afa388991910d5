//! Lesson API tests.

mod common;

use axum::http::StatusCode;

use common::fixtures::{self, LEVEL_ONE, LEVEL_TWO, OTHER_USER, USER};
use common::TestContext;

fn ids(body: &serde_json::Value) -> Vec<i64> {
    body["data"]["card_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect()
}

/// Test lessons list every unstarted card at the user's level.
#[tokio::test]
async fn test_lessons_at_user_level() {
    let ctx = TestContext::in_memory().await;
    let server = ctx.server();

    let response = server.get(&format!("/v1/api/lessons/{}", USER)).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), LEVEL_ONE.to_vec());
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["cards"][0]["word"], "maison");

    let response = server.get(&format!("/v1/api/lessons/{}", OTHER_USER)).await;
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec![LEVEL_TWO]);
}

/// Test num_cards caps the lesson list.
#[tokio::test]
async fn test_lessons_limit() {
    let ctx = TestContext::in_memory().await;
    let server = ctx.server();

    let response = server
        .get(&format!("/v1/api/lessons/{}", USER))
        .add_query_param("num_cards", 2)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec![101, 102]);
}

/// Test invalid input is rejected before reaching the store.
#[tokio::test]
async fn test_lessons_validation() {
    let ctx = TestContext::in_memory().await;
    let server = ctx.server();

    server
        .get(&format!("/v1/api/lessons/{}", USER))
        .add_query_param("num_cards", -1)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/v1/api/lessons/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/v1/api/lessons/99")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// Test starting lessons introduces cards at stage 0.
#[tokio::test]
async fn test_start_lessons() {
    let ctx = TestContext::in_memory().await;
    let server = ctx.server();

    let response = server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[101, 103]))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["stage_id"] == 0));
    assert_eq!(results[1]["card_word"], "chat");

    let response = server.get(&format!("/v1/api/lessons/{}", USER)).await;
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec![102, 104]);
}

/// Test a started card cannot be started again and the batch is rejected.
#[tokio::test]
async fn test_start_lessons_twice() {
    let ctx = TestContext::in_memory().await;
    let server = ctx.server();

    server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[101]))
        .await
        .assert_status_ok();

    server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[102, 101]))
        .await
        .assert_status(StatusCode::CONFLICT);

    // 102 was not started by the rejected batch
    let response = server.get(&format!("/v1/api/lessons/{}", USER)).await;
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec![102, 103, 104]);
}

/// Test unknown cards and empty lists.
#[tokio::test]
async fn test_start_lessons_validation() {
    let ctx = TestContext::in_memory().await;
    let server = ctx.server();

    server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[999]))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[]))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// Test lessons against PostgreSQL.
#[tokio::test]
#[ignore = "requires database"]
async fn test_start_lessons_postgres() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[101]))
        .await
        .assert_status_ok();

    let response = server.get(&format!("/v1/api/lessons/{}", USER)).await;
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec![102, 103, 104]);

    server
        .post(&format!("/v1/api/lessons/{}", USER))
        .json(&fixtures::card_ids(&[101]))
        .await
        .assert_status(StatusCode::CONFLICT);
}

/// Test level 0 learners are offered level 0 cards on PostgreSQL.
#[tokio::test]
#[ignore = "requires database"]
async fn test_level_zero_lessons_postgres() {
    let ctx = TestContext::new().await;
    fixtures::insert_level_zero(ctx.database()).await;
    let server = ctx.server();

    let response = server
        .get(&format!("/v1/api/lessons/{}", fixtures::LEVEL_ZERO_USER))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(ids(&body), vec![fixtures::LEVEL_ZERO_CARD]);
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, wait_for_task, VALID_TOKEN};
use axum::http::StatusCode;
use sea_orm::EntityTrait;
use serde_json::json;
use smishrs::domain::models::task::{AnalysisTask, TaskStatus};
use smishrs::infrastructure::database::entities::analysis_task;

#[tokio::test]
async fn test_analyze_happy_path() {
    let app = create_test_app().await;

    // 1. 提交分析请求，立即返回202与Pending任务
    let response = app
        .server
        .post("/api/v1/analyze")
        .json(&json!({
            "url": "https://a.test/x",
            "request_uuid": "r1",
            "auth_token": VALID_TOKEN,
            "analysis_id": "an-1"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let task: AnalysisTask = response.json();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.url, "https://a.test/x");
    assert_eq!(task.request_uuid, "r1");

    // 2. 后台启动完成后任务转入Running并持有外部句柄
    let running = wait_for_task(&app.task_repo, task.id, |t| {
        t.status == TaskStatus::Running
    })
    .await;
    assert!(!running.external_id.is_empty());

    // 3. 平台上报完成，轮询一轮后任务终结
    app.executor.set_bot_status(TaskStatus::Completed);
    app.service.check_running_tasks().await.unwrap();

    let response = app
        .server
        .get(&format!("/api/v1/status/{}", task.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let done: AnalysisTask = response.json();
    assert_eq!(done.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_analyze_deduplicates_concurrent_requests() {
    let app = create_test_app().await;

    let body = json!({
        "url": "https://a.test/y",
        "request_uuid": "r1",
        "auth_token": VALID_TOKEN
    });

    let first: AnalysisTask = app.server.post("/api/v1/analyze").json(&body).await.json();
    let second: AnalysisTask = app.server.post("/api/v1/analyze").json(&body).await.json();

    // 两次请求折叠到同一个在途任务
    assert_eq!(first.id, second.id);

    let stored = analysis_task::Entity::find()
        .all(app.db_pool.as_ref())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_webhook_overrides_running_task() {
    let app = create_test_app().await;

    let task: AnalysisTask = app
        .server
        .post("/api/v1/analyze")
        .json(&json!({
            "url": "https://a.test/hook",
            "request_uuid": "r1",
            "auth_token": VALID_TOKEN
        }))
        .await
        .json();
    wait_for_task(&app.task_repo, task.id, |t| t.status == TaskStatus::Running).await;

    let response = app
        .server
        .post("/api/v1/webhook")
        .json(&json!({
            "task_id": task.id.to_string(),
            "status": "COMPLETED",
            "result": "clean"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>()["message"], "Status updated");

    let done: AnalysisTask = app
        .server
        .get(&format!("/api/v1/status/{}", task.id))
        .await
        .json();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.result, "clean");
}

#[tokio::test]
async fn test_analyze_rejects_bad_url() {
    let app = create_test_app().await;

    for bad in ["ftp://x.test/a", "not a url", ""] {
        let response = app
            .server
            .post("/api/v1/analyze")
            .json(&json!({
                "url": bad,
                "request_uuid": "r1",
                "auth_token": VALID_TOKEN
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", bad);
    }

    // 校验失败的请求不落库
    let stored = analysis_task::Entity::find()
        .all(app.db_pool.as_ref())
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_analyze_rejects_bad_token() {
    let app = create_test_app().await;

    // 伪造令牌
    let response = app
        .server
        .post("/api/v1/analyze")
        .json(&json!({
            "url": "https://a.test/x",
            "request_uuid": "r1",
            "auth_token": "forged"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // 缺失令牌，默认策略拒绝
    let response = app
        .server
        .post("/api/v1/analyze")
        .json(&json!({
            "url": "https://a.test/x",
            "request_uuid": "r1"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_status_error_paths() {
    let app = create_test_app().await;

    // 非法ID
    let response = app.server.get("/api/v1/status/not-a-uuid").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // 未知ID
    let response = app
        .server
        .get(&format!("/api/v1/status/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_rejects_bad_task_id() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/v1/webhook")
        .json(&json!({
            "task_id": "not-a-uuid",
            "status": "COMPLETED",
            "result": ""
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_version() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");

    let response = app.server.get("/v1/version").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

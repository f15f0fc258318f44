// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, wait_for_task, MAX_RETRIES, VALID_TOKEN};
use smishrs::domain::models::task::TaskStatus;
use smishrs::domain::repositories::task_repository::TaskRepository;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_retry_cycle_recovers_after_launch_failure() {
    let app = create_test_app().await;
    app.executor.set_fail_launch(true);

    // 启动失败的任务落入Failed，retry_count仍为0
    let task = app
        .service
        .create_task("https://a.test/retry", "r1", Some(VALID_TOKEN), "")
        .await
        .unwrap();
    let failed = wait_for_task(&app.task_repo, task.id, |t| {
        t.status == TaskStatus::Failed
    })
    .await;
    assert_eq!(failed.retry_count, 0);
    assert!(failed.result.contains("launch rejected"));

    // 重试扫描：递增计数、重置Pending、重新启动；本次启动成功
    app.executor.set_fail_launch(false);
    app.service.retry_failed_tasks().await.unwrap();

    let running = wait_for_task(&app.task_repo, task.id, |t| {
        t.status == TaskStatus::Running && t.retry_count == 1
    })
    .await;
    assert!(!running.external_id.is_empty());

    // 平台上报完成后任务终结
    app.executor.set_bot_status(TaskStatus::Completed);
    app.service.check_running_tasks().await.unwrap();

    let done = app.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.retry_count, 1);
}

#[tokio::test]
async fn test_retry_exhaustion_leaves_task_failed() {
    let app = create_test_app().await;
    app.executor.set_fail_launch(true);

    let task = app
        .service
        .create_task("https://a.test/doomed", "r1", Some(VALID_TOKEN), "")
        .await
        .unwrap();
    wait_for_task(&app.task_repo, task.id, |t| t.status == TaskStatus::Failed).await;

    // 启动共失败4次：首次 + 3轮重试
    for round in 1..=MAX_RETRIES {
        app.service.retry_failed_tasks().await.unwrap();
        wait_for_task(&app.task_repo, task.id, |t| {
            t.status == TaskStatus::Failed && t.retry_count == round
        })
        .await;
    }

    // 次数耗尽：扫描不再选中，去重也不再命中
    app.service.retry_failed_tasks().await.unwrap();
    let exhausted = app.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(exhausted.status, TaskStatus::Failed);
    assert_eq!(exhausted.retry_count, MAX_RETRIES);
    assert_eq!(
        app.executor.run_calls.load(Ordering::SeqCst),
        1 + MAX_RETRIES as usize
    );
    assert!(app
        .task_repo
        .get_active_task_by_url("https://a.test/doomed")
        .await
        .unwrap()
        .is_none());

    // 终结后的URL允许重新建任务
    let fresh = app
        .service
        .create_task("https://a.test/doomed", "r2", Some(VALID_TOKEN), "")
        .await
        .unwrap();
    assert_ne!(fresh.id, task.id);
}

#[tokio::test]
async fn test_poll_skips_tasks_with_pending_launch() {
    let app = create_test_app().await;

    // 手工放入一个启动例程尚未回写external_id的Running任务
    let mut stuck = smishrs::domain::models::task::AnalysisTask::new(
        "https://a.test/stuck".to_string(),
        "r1".to_string(),
        String::new(),
    );
    stuck.status = TaskStatus::Running;
    app.task_repo.create(&stuck).await.unwrap();

    app.service.check_running_tasks().await.unwrap();

    // 不发起任何平台查询，状态保持不变
    assert_eq!(app.executor.status_calls.load(Ordering::SeqCst), 0);
    let unchanged = app.task_repo.find_by_id(stuck.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, TaskStatus::Running);
}

#[tokio::test]
async fn test_poll_preserves_result_on_status_change() {
    let app = create_test_app().await;

    let task = app
        .service
        .create_task("https://a.test/keep", "r1", Some(VALID_TOKEN), "")
        .await
        .unwrap();
    wait_for_task(&app.task_repo, task.id, |t| t.status == TaskStatus::Running).await;

    // Webhook先行写入了结果
    app.service
        .update_task_status(task.id, TaskStatus::Running, "partial verdict")
        .await
        .unwrap();

    app.executor.set_bot_status(TaskStatus::Completed);
    app.service.check_running_tasks().await.unwrap();

    let done = app.task_repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    // 轮询回写只改状态，保留已有结果
    assert_eq!(done.result, "partial verdict");
}

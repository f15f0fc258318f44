// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::Extension;
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use smishrs::domain::models::task::{AnalysisTask, TaskStatus};
use smishrs::domain::repositories::task_repository::TaskRepository;
use smishrs::domain::services::bot_executor::{BotExecutor, ExecutorError};
use smishrs::domain::services::task_service::TaskService;
use smishrs::domain::services::token_verifier::{AuthError, TokenVerifier};
use smishrs::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use smishrs::presentation::routes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const MAX_RETRIES: i32 = 3;
pub const VALID_TOKEN: &str = "valid-token";

/// 脚本化的执行器
///
/// 用可控的内存实现替代ECS，驱动编排流程测试
pub struct MockBotExecutor {
    fail_launch: AtomicBool,
    bot_status: Mutex<TaskStatus>,
    pub run_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl MockBotExecutor {
    pub fn new() -> Self {
        Self {
            fail_launch: AtomicBool::new(false),
            bot_status: Mutex::new(TaskStatus::Running),
            run_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_launch(&self, fail: bool) {
        self.fail_launch.store(fail, Ordering::SeqCst);
    }

    pub fn set_bot_status(&self, status: TaskStatus) {
        *self.bot_status.lock().unwrap() = status;
    }
}

#[async_trait]
impl BotExecutor for MockBotExecutor {
    async fn run_bot(&self, _task: &AnalysisTask) -> Result<String, ExecutorError> {
        let n = self.run_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(ExecutorError::Platform("launch rejected".to_string()));
        }
        Ok(format!(
            "arn:aws:ecs:ap-northeast-2:000000000000:task/test/{}",
            n
        ))
    }

    async fn get_bot_status(&self, _external_id: &str) -> Result<TaskStatus, ExecutorError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.bot_status.lock().unwrap())
    }
}

/// 只接受固定令牌的验证器
pub struct StaticTokenVerifier;

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<(), AuthError> {
        if token == VALID_TOKEN {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db_pool: Arc<DatabaseConnection>,
    pub task_repo: Arc<TaskRepositoryImpl>,
    pub executor: Arc<MockBotExecutor>,
    pub service: Arc<TaskService<TaskRepositoryImpl, MockBotExecutor, StaticTokenVerifier>>,
}

pub async fn create_test_app() -> TestApp {
    // 1. Setup SQLite
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db_pool = Arc::new(db);

    // Run migrations
    Migrator::up(db_pool.as_ref(), None).await.unwrap();

    // 2. Initialize components
    let task_repo = Arc::new(TaskRepositoryImpl::new(db_pool.clone(), MAX_RETRIES));
    let executor = Arc::new(MockBotExecutor::new());
    let service = Arc::new(TaskService::new(
        task_repo.clone(),
        executor.clone(),
        Arc::new(StaticTokenVerifier),
        MAX_RETRIES,
        true,
    ));

    // 3. Build the app router
    let app = routes::routes::<TaskRepositoryImpl, MockBotExecutor, StaticTokenVerifier>()
        .layer(Extension(service.clone()));

    let server = TestServer::new(app).unwrap();

    TestApp {
        server,
        db_pool,
        task_repo,
        executor,
        service,
    }
}

/// 等待分离式启动例程完成并满足断言条件
pub async fn wait_for_task<F>(repo: &TaskRepositoryImpl, id: Uuid, pred: F) -> AnalysisTask
where
    F: Fn(&AnalysisTask) -> bool,
{
    for _ in 0..100 {
        if let Some(task) = repo.find_by_id(id).await.unwrap() {
            if pred(&task) {
                return task;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Task {} never reached the expected state", id);
}
